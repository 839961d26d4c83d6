//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/transactions/{transaction_id}', use [format_endpoint].

/// The collection of transactions: list, create and delete all.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// A single transaction.
pub const TRANSACTION_API: &str = "/api/transactions/{transaction_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// The parameter is the first path segment wrapped in braces, e.g. `{transaction_id}`.
/// Paths without a parameter are returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: &str) -> String {
    let Some(start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let end = endpoint_path[start..]
        .find('}')
        .map(|offset| start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!("{}{}{}", &endpoint_path[..start], id, &endpoint_path[end..])
}

#[cfg(test)]
mod tests {
    use super::{TRANSACTION_API, TRANSACTIONS_API, format_endpoint};

    #[test]
    fn formats_parameterised_endpoint() {
        assert_eq!(
            format_endpoint(TRANSACTION_API, "42"),
            "/api/transactions/42"
        );
    }

    #[test]
    fn leaves_plain_endpoint_unchanged() {
        assert_eq!(format_endpoint(TRANSACTIONS_API, "42"), TRANSACTIONS_API);
    }
}
