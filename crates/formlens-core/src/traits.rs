use crate::{FormResponse, FormSchema, Result};
use async_trait::async_trait;

/// Source of submitted responses for a form.
#[async_trait]
pub trait ResponseRepository: Send + Sync {
    /// All responses of the form, newest submission first.
    async fn list_responses(&self, form_id: &str) -> Result<Vec<FormResponse>>;
}

/// Primary store of form layouts.
#[async_trait]
pub trait FormSchemaProvider: Send + Sync {
    /// `Ok(None)` when the form exists but has no saved schema yet.
    /// `Err(FormLensError::FormNotFound)` when the form itself is unknown.
    async fn get_schema(&self, form_id: &str) -> Result<Option<FormSchema>>;
}

/// Secondary schema source backed by the collaborative editing document,
/// consulted when the primary schema is empty.
#[async_trait]
pub trait CollaborativeSchemaSource: Send + Sync {
    async fn load_schema(&self, form_id: &str) -> Result<Option<FormSchema>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FormLensError;
    use chrono::Utc;
    use std::collections::HashMap;

    struct FixedForm;

    #[async_trait]
    impl ResponseRepository for FixedForm {
        async fn list_responses(&self, form_id: &str) -> Result<Vec<FormResponse>> {
            Ok(vec![FormResponse {
                response_id: format!("{}-r1", form_id),
                data: HashMap::new(),
                submitted_at: Utc::now(),
            }])
        }
    }

    #[async_trait]
    impl FormSchemaProvider for FixedForm {
        async fn get_schema(&self, form_id: &str) -> Result<Option<FormSchema>> {
            match form_id {
                "known" => Ok(None),
                other => Err(FormLensError::FormNotFound(other.to_string())),
            }
        }
    }

    #[test]
    fn test_collaborators_are_object_safe() {
        let repo: Box<dyn ResponseRepository> = Box::new(FixedForm);
        let schemas: Box<dyn FormSchemaProvider> = Box::new(FixedForm);

        let responses = tokio_test::block_on(repo.list_responses("f")).unwrap();
        assert_eq!(responses[0].response_id, "f-r1");

        assert!(tokio_test::block_on(schemas.get_schema("known")).unwrap().is_none());
        assert!(matches!(
            tokio_test::block_on(schemas.get_schema("other")),
            Err(FormLensError::FormNotFound(_))
        ));
    }
}
