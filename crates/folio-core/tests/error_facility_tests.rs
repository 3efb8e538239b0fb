use chrono::{TimeZone, Utc};
use folio_core::errors::{ExError, ExErrorKind, FolioError};
use folio_core_types::RequestId;

#[test]
fn test_lease_not_held_is_forbidden() {
    let ex: ExError = FolioError::LeaseNotHeld {
        document_id: "doc-1".to_string(),
        actor: "bob".to_string(),
    }
    .into();

    assert_eq!(ex.kind(), ExErrorKind::Forbidden);
    assert_eq!(ex.actor(), Some("bob"));
    assert_eq!(ex.document_id(), Some("doc-1"));
}

#[test]
fn test_release_forbidden_names_holder() {
    let ex: ExError = FolioError::ReleaseForbidden {
        document_id: "doc-1".to_string(),
        actor: "bob".to_string(),
        holder: "alice".to_string(),
    }
    .into();

    assert_eq!(ex.code(), "ERR_FORBIDDEN");
    assert_eq!(ex.holder(), Some("alice"));
}

#[test]
fn test_display_includes_op_and_holder() {
    let since = Utc.with_ymd_and_hms(2026, 5, 4, 8, 30, 0).unwrap();
    let ex: ExError = FolioError::LeaseConflict {
        document_id: "doc-7".to_string(),
        holder: "carol".to_string(),
        since,
    }
    .into();
    let rendered = ex.with_op("acquire_lease").to_string();

    assert!(rendered.starts_with("[ERR_CONFLICT] in operation 'acquire_lease'"));
    assert!(rendered.contains("(document_id: doc-7)"));
    assert!(rendered.contains("held by carol since 2026-05-04T08:30:00"));
}

#[test]
fn test_request_id_survives_conversion() {
    let request_id = RequestId::from("req-123".to_string());
    let ex: ExError = FolioError::DocumentNotFound {
        document_id: "missing".to_string(),
    }
    .into();
    let ex = ex.with_request_id(request_id.clone());

    assert_eq!(ex.request_id(), Some(&request_id));
    assert_eq!(ex.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_serde_error_becomes_serialization() {
    let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
    let err: FolioError = parse.unwrap_err().into();
    let ex: ExError = err.into();
    assert_eq!(ex.kind(), ExErrorKind::Serialization);
}
