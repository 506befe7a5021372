//-----------------------------------------------------------------------------
// Proto Type URL Utilities
//-----------------------------------------------------------------------------
//
// Small helpers for working with `google.protobuf.Any.type_url` values, kept
// separate from the registry and codec since both need them.

/// Strips the leading `/` (and any host prefix before it, e.g.
/// `type.googleapis.com/`) from a type URL, returning the bare fully
/// qualified message name.
///
/// `"/cosmos.bank.v1beta1.MsgSend"` and
/// `"type.googleapis.com/cosmos.bank.v1beta1.MsgSend"` both yield
/// `"cosmos.bank.v1beta1.MsgSend"`.
pub fn full_name_from_url(type_url: &str) -> String {
    match type_url.rfind('/') {
        Some(i) => type_url[i + 1..].to_string(),
        None => type_url.to_string(),
    }
}

/// Builds the normalized `Any.type_url` this client writes everywhere:
/// exactly one leading slash followed by the fully qualified message name.
pub fn type_url_from_full_name(full_name: &str) -> String {
    format!("/{}", full_name.trim_start_matches('/'))
}
