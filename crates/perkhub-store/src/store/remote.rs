//! REST proxy adapter for [`LedgerStore`].
//!
//! Used when the points ledger is owned by a separate deployment.
//! Workflow errors travel as a JSON envelope carrying the machine-
//! readable code, so a remote `INSUFFICIENT_POINTS` surfaces to callers
//! exactly like a local one; anything unmappable becomes
//! `EXTERNAL_SERVICE`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use perkhub_core::config::store::RemoteStoreConfig;
use perkhub_core::error::{AppError, ErrorKind};
use perkhub_core::result::AppResult;
use perkhub_core::types::{CustomerId, PageRequest, PageResponse, ProgramId};
use perkhub_entity::card::{CardActivity, LoyaltyCard};
use perkhub_entity::enrollment::{Enrollment, EnrollmentStatus, NewEnrollment};
use perkhub_entity::ledger::{NewPointTransaction, PointTransaction};

use crate::store::{LedgerStore, LedgerUpdate};

/// Error envelope returned by the remote ledger service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Wire shape of a remote ledger update.
#[derive(Debug, Deserialize)]
struct LedgerUpdateBody {
    transaction: PointTransaction,
    balance: i64,
    total_earned: i64,
    card: LoyaltyCard,
    previous_tier: perkhub_entity::card::Tier,
}

impl From<LedgerUpdateBody> for LedgerUpdate {
    fn from(body: LedgerUpdateBody) -> Self {
        Self {
            transaction: body.transaction,
            balance: body.balance,
            total_earned: body.total_earned,
            card: body.card,
            previous_tier: body.previous_tier,
        }
    }
}

/// [`LedgerStore`] implementation backed by a remote REST service.
#[derive(Debug, Clone)]
pub struct RemoteLedgerStore {
    client: Client,
    base_url: String,
}

impl RemoteLedgerStore {
    pub fn new(config: &RemoteStoreConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build remote ledger HTTP client",
                    e,
                )
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Decode a success body, or translate the error envelope.
    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> AppResult<T> {
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    "Invalid response body from remote ledger",
                    e,
                )
            });
        }

        match response.json::<ErrorBody>().await {
            Ok(body) => Err(AppError::new(kind_from_code(&body.code), body.message)),
            Err(_) => Err(AppError::external_service(format!(
                "Remote ledger returned status {status}"
            ))),
        }
    }

    async fn decode_optional<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> AppResult<Option<T>> {
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(response).await.map(Some)
    }

    fn transport_err(e: reqwest::Error) -> AppError {
        AppError::with_source(ErrorKind::ExternalService, "Remote ledger request failed", e)
    }
}

/// Map a remote error code back onto the local taxonomy.
fn kind_from_code(code: &str) -> ErrorKind {
    match code {
        "NOT_FOUND" => ErrorKind::NotFound,
        "INVALID_PARAMETERS" => ErrorKind::InvalidParameters,
        "ALREADY_PENDING" => ErrorKind::AlreadyPending,
        "ALREADY_ENROLLED" => ErrorKind::AlreadyEnrolled,
        "ALREADY_PROCESSED" => ErrorKind::AlreadyProcessed,
        "EXPIRED" => ErrorKind::Expired,
        "NOT_ENROLLED" => ErrorKind::NotEnrolled,
        "INSUFFICIENT_POINTS" => ErrorKind::InsufficientPoints,
        _ => ErrorKind::ExternalService,
    }
}

#[async_trait]
impl LedgerStore for RemoteLedgerStore {
    async fn find_enrollment(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<Option<Enrollment>> {
        let response = self
            .client
            .get(self.url(&format!("/enrollments/{customer_id}/{program_id}")))
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::decode_optional(response).await
    }

    async fn create_enrollment(&self, new: &NewEnrollment) -> AppResult<Enrollment> {
        let response = self
            .client
            .post(self.url("/enrollments"))
            .json(new)
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::decode(response).await
    }

    async fn remove_unactivated_enrollment(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<bool> {
        let response = self
            .client
            .delete(self.url(&format!("/enrollments/{customer_id}/{program_id}/unactivated")))
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::decode(response).await
    }

    async fn set_enrollment_status(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    ) -> AppResult<bool> {
        let response = self
            .client
            .put(self.url(&format!("/enrollments/{customer_id}/{program_id}/status")))
            .json(&serde_json::json!({ "from": from, "to": to }))
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::decode(response).await
    }

    async fn activate_with_card(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        card_number: &str,
    ) -> AppResult<LoyaltyCard> {
        let response = self
            .client
            .post(self.url(&format!("/enrollments/{customer_id}/{program_id}/activate")))
            .json(&serde_json::json!({ "card_number": card_number }))
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::decode(response).await
    }

    async fn apply_transaction(&self, tx: &NewPointTransaction) -> AppResult<LedgerUpdate> {
        let response = self
            .client
            .post(self.url("/transactions"))
            .json(tx)
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::decode::<LedgerUpdateBody>(response).await.map(Into::into)
    }

    async fn transaction_history(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<PointTransaction>> {
        let response = self
            .client
            .get(self.url(&format!("/transactions/{customer_id}/{program_id}")))
            .query(&[("page", page.page), ("page_size", page.page_size)])
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::decode(response).await
    }

    async fn find_card(
        &self,
        customer_id: CustomerId,
        program_id: ProgramId,
    ) -> AppResult<Option<LoyaltyCard>> {
        let response = self
            .client
            .get(self.url(&format!("/cards/{customer_id}/{program_id}")))
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::decode_optional(response).await
    }

    async fn record_activity(&self, activity: &CardActivity) -> AppResult<()> {
        let response = self
            .client
            .post(self.url("/card-activities"))
            .json(activity)
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::decode::<serde_json::Value>(response).await.map(|_| ())
    }

    async fn remove_program_enrollments(
        &self,
        program_id: ProgramId,
    ) -> AppResult<Vec<Enrollment>> {
        let response = self
            .client
            .delete(self.url(&format!("/programs/{program_id}/enrollments")))
            .send()
            .await
            .map_err(Self::transport_err)?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping_round_trips_workflow_codes() {
        assert_eq!(kind_from_code("NOT_ENROLLED"), ErrorKind::NotEnrolled);
        assert_eq!(
            kind_from_code("INSUFFICIENT_POINTS"),
            ErrorKind::InsufficientPoints
        );
        assert_eq!(kind_from_code("SOMETHING_ELSE"), ErrorKind::ExternalService);
    }
}
