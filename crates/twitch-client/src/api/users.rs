use super::*;
use crate::TwitchError;

/// Resolve the login name of the token holder from the API root.
///
/// Returns `Ok(None)` when the root answers but carries no user name,
/// which happens for unauthenticated requests.
pub async fn authenticated_username<T: Transport>(
    transport: &T,
) -> Result<Option<String>, TwitchError> {
    let url = endpoint_url(transport.base_url(), "", &[])?;
    let resp = transport.get(url).await?;
    if resp.status != 200 {
        return Err(TwitchError::Status {
            status: resp.status,
            message: resp.body,
        });
    }

    let root: RootResponse = serde_json::from_str(&resp.body)?;
    Ok(root.token.user_name.filter(|name| !name.is_empty()))
}
