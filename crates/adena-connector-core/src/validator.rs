use serde_json::Value;

use crate::domain::ProviderResponse;

/// Single success predicate shared by every connector operation.
pub fn is_success(resp: Option<&ProviderResponse>) -> bool {
    match resp {
        Some(resp) => resp.code == 0 && has_data(resp),
        None => false,
    }
}

fn has_data(resp: &ProviderResponse) -> bool {
    !matches!(resp.data, None | Some(Value::Null))
}
