use crate::{endpoints::EndpointError, session::User};
use reqwest::Client;
use serde_derive::{Deserialize, Serialize};

/// Fetch the profile of the user this token belongs to.
pub async fn get_profile(
    client: &Client,
    base_url: &str,
    token: &str,
) -> Result<User, EndpointError> {
    let response: ProfileResponse =
        super::get(client, base_url, "auth/profile", Some(token), &[]).await?;

    Ok(response.user)
}

/// Update the current user's name and/or password.
///
/// Returns the refreshed user when the server includes one in its
/// response.
pub async fn update_profile(
    client: &Client,
    base_url: &str,
    token: &str,
    update: &ProfileUpdate,
) -> Result<Option<User>, EndpointError> {
    let response: UpdateResponse =
        super::put(client, base_url, "auth/profile", Some(token), update).await?;

    Ok(response.user)
}

/// The fields that may be changed on a profile. Changing the password
/// requires the current one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct ProfileResponse {
    user: User,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct UpdateResponse {
    #[serde(default)]
    user: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_update_serializes_camel_case_and_skips_absent_fields() {
        let update = ProfileUpdate {
            name: None,
            current_password: Some(String::from("old pw")),
            new_password: Some(String::from("new pw")),
        };

        let json = serde_json::to_value(&update).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "currentPassword": "old pw",
                "newPassword": "new pw"
            })
        );
    }
}
