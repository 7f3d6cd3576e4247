//! Port error mapping into domain errors.

use serde_json::json;

use crate::domain::Error;
use crate::domain::ports::{
    CmsClientError, NodeStoreError, SchemaRegistrarError, TypePathCacheError,
};

pub(super) fn map_cms_error(error: CmsClientError, page: u32) -> Error {
    match error {
        CmsClientError::Unauthorized { message } => {
            Error::configuration(format!("cms rejected the configured credentials: {message}"))
        }
        CmsClientError::Transport { message } | CmsClientError::Decode { message } => {
            Error::service_unavailable(format!("failed to fetch documents: {message}"))
                .with_details(json!({ "page": page }))
        }
    }
}

pub(super) fn map_store_error(error: NodeStoreError) -> Error {
    match error {
        NodeStoreError::Write { message }
        | NodeStoreError::Delete { message }
        | NodeStoreError::Read { message } => {
            Error::service_unavailable(format!("node store unavailable: {message}"))
        }
    }
}

pub(super) fn map_cache_error(error: TypePathCacheError) -> Error {
    match error {
        TypePathCacheError::Read { message } | TypePathCacheError::Write { message } => {
            Error::service_unavailable(format!("type path cache unavailable: {message}"))
        }
        TypePathCacheError::Decode { message } => {
            Error::configuration(format!("type path cache holds an unreadable snapshot: {message}"))
        }
    }
}

pub(super) fn map_registrar_error(error: SchemaRegistrarError) -> Error {
    match error {
        SchemaRegistrarError::Rejected { message } => {
            Error::configuration(format!("host rejected the declared schema: {message}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(CmsClientError::unauthorized("bad token"), ErrorCode::Configuration, None)]
    #[case(CmsClientError::transport("reset"), ErrorCode::ServiceUnavailable, Some(json!({ "page": 4 })))]
    #[case(CmsClientError::decode("truncated"), ErrorCode::ServiceUnavailable, Some(json!({ "page": 4 })))]
    fn cms_errors_map_by_cause(
        #[case] error: CmsClientError,
        #[case] code: ErrorCode,
        #[case] details: Option<serde_json::Value>,
    ) {
        let mapped = map_cms_error(error, 4);
        assert_eq!(mapped.code(), code);
        assert_eq!(mapped.details(), details.as_ref());
    }

    #[test]
    fn unreadable_cache_snapshots_are_configuration_errors() {
        assert_eq!(
            map_cache_error(TypePathCacheError::decode("eof")).code(),
            ErrorCode::Configuration
        );
        assert_eq!(
            map_cache_error(TypePathCacheError::read("denied")).code(),
            ErrorCode::ServiceUnavailable
        );
    }
}
