//! Destination builders for GET and POST calls.

use crate::context::Context;
use crate::request::Params;
use serde_json::Value;
use url::form_urlencoded;

/// Percent-encode one URI component. Spaces become `%20`, never `+`.
pub fn encode_component(raw: &str) -> String {
    // A literal '+' is emitted as %2B, so every '+' left is an encoded space.
    form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Canonical string form of a parameter value: strings as-is, everything
/// else as compact JSON.
pub fn param_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn segment(key: &str, value: &str) -> String {
    format!("{}={}", encode_component(key), encode_component(value))
}

/// Encoded `k=v` segments ordered by raw key, then value.
fn sorted_segments<'a>(pairs: impl Iterator<Item = (&'a str, String)>) -> Vec<String> {
    let mut pairs: Vec<(&str, String)> = pairs.collect();
    pairs.sort();
    pairs.into_iter().map(|(k, v)| segment(k, &v)).collect()
}

/// Context pairs sorted by key and joined with `&`, without the `?`.
pub fn context_query(context: &Context, include_crumb: bool) -> String {
    sorted_segments(
        context
            .query_pairs(include_crumb)
            .map(|(k, v)| (k, v.to_string())),
    )
    .join("&")
}

fn with_query(mut uri: String, query: &str) -> String {
    if !query.is_empty() {
        uri.push('?');
        uri.push_str(query);
    }
    uri
}

/// `<base>/resource/<resource>[/<idParam>/<idValue>][;k=v...][?ctx=v&...]`
pub fn get_uri(
    base: &str,
    resource: &str,
    params: &Params,
    id_param: Option<&str>,
    context: &Context,
    include_crumb: bool,
) -> String {
    let mut uri = format!("{}/resource/{}", base, encode_component(resource));

    let id = id_param.and_then(|name| params.get(name).map(|v| (name, v)));
    if let Some((name, value)) = id {
        uri.push('/');
        uri.push_str(&encode_component(name));
        uri.push('/');
        uri.push_str(&encode_component(&param_string(value)));
    }

    let matrix = sorted_segments(
        params
            .iter()
            .filter(|(k, _)| Some(k.as_str()) != id_param)
            .map(|(k, v)| (k.as_str(), param_string(v))),
    );
    for m in &matrix {
        uri.push(';');
        uri.push_str(m);
    }

    with_query(uri, &context_query(context, include_crumb))
}

/// POST destination: the base plus the full context (crumb included) as a
/// query string. Resource, params and body travel in the envelope.
pub fn post_uri(base: &str, context: &Context) -> String {
    with_query(base.to_string(), &context_query(context, true))
}
