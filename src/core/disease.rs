//! Plant disease reports.
//!
//! Diagnosis is delegated to an injected [`DiseaseAnalyzer`] so the core never
//! talks to the image-analysis API directly. Extension officers then review
//! each report: `pending -> reviewed -> treated`.

use crate::{
    core::{
        notification::{NewNotification, notify},
        user::require_active,
    },
    entities::{DiseaseReport, NotificationType, ReportStatus, Role, disease_report, user},
    errors::{Error, Result},
};
use async_trait::async_trait;
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use tracing::{info, warn};

/// What an analyzer concluded about a photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    /// Whether the image shows a plant at all
    pub is_plant: bool,
    /// Treatment advice shown to the farmer
    pub treatment_recommendation: String,
}

/// Image-analysis collaborator.
#[async_trait]
pub trait DiseaseAnalyzer: Send + Sync {
    /// Diagnoses the plant in `image`, using the farmer's `description` as context.
    async fn analyze(&self, image: &[u8], description: &str) -> Result<Diagnosis>;
}

/// A farmer's photo and description of a sick plant.
#[derive(Debug, Clone, Default)]
pub struct NewReport {
    /// Raw image bytes handed to the analyzer
    pub image: Vec<u8>,
    /// Where the stored image lives, if it was kept
    pub image_path: Option<String>,
    /// Symptoms in the farmer's words
    pub description: String,
    /// Place name
    pub location: Option<String>,
    /// GPS latitude
    pub latitude: Option<f64>,
    /// GPS longitude
    pub longitude: Option<f64>,
}

/// Runs the analyzer on a farmer's photo and stores the result as a pending report.
///
/// Images the analyzer does not recognise as a plant are still stored, with
/// `is_plant = false`, so officers can follow up.
///
/// # Errors
/// `Forbidden` for non-farmers, `Validation` for an empty image or description,
/// and whatever the analyzer returns when it fails.
pub async fn submit_report(
    db: &DatabaseConnection,
    analyzer: &dyn DiseaseAnalyzer,
    farmer: &user::Model,
    report: NewReport,
) -> Result<disease_report::Model> {
    require_active(farmer)?;
    if farmer.role != Role::Farmer {
        return Err(Error::forbidden("only farmers can submit disease reports"));
    }
    let description = report.description.trim().to_string();
    if report.image.is_empty() || description.is_empty() {
        return Err(Error::validation("An image and a description are required"));
    }

    let diagnosis = analyzer.analyze(&report.image, &description).await?;
    if !diagnosis.is_plant {
        warn!(farmer_id = farmer.id, "Analyzer did not recognise a plant");
    }

    let stored = disease_report::ActiveModel {
        farmer_id: Set(farmer.id),
        plant_image: Set(report.image_path),
        plant_description: Set(description),
        treatment_recommendation: Set(diagnosis.treatment_recommendation),
        is_plant: Set(diagnosis.is_plant),
        location: Set(report.location),
        latitude: Set(report.latitude),
        longitude: Set(report.longitude),
        status: Set(ReportStatus::Pending),
        reviewed_by: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(report_id = stored.id, farmer_id = farmer.id, "Disease report submitted");
    Ok(stored)
}

/// Advances a report one step and notifies the farmer.
///
/// # Errors
/// `Forbidden` unless the reviewer is an extension officer or admin,
/// `NotFound` for an unknown report and `InvalidTransition` for a skipped or
/// backward step.
pub async fn review_report(
    db: &DatabaseConnection,
    reviewer: &user::Model,
    report_id: i64,
    status: ReportStatus,
) -> Result<disease_report::Model> {
    require_active(reviewer)?;
    if !reviewer.role.can_review_disease_reports() {
        return Err(Error::forbidden("only extension officers can review reports"));
    }

    let txn = db.begin().await?;
    let report = DiseaseReport::find_by_id(report_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("disease report", report_id))?;
    if !report.status.can_transition_to(status) {
        return Err(Error::InvalidTransition {
            from: report.status.as_str().to_string(),
            to: status.as_str().to_string(),
        });
    }

    let farmer_id = report.farmer_id;
    let mut active: disease_report::ActiveModel = report.into();
    active.status = Set(status);
    active.reviewed_by = Set(Some(reviewer.id));
    let updated = active.update(&txn).await?;

    notify(
        &txn,
        farmer_id,
        NewNotification::info(
            "Disease Report Updated",
            format!("{} marked your report as {}", reviewer.full_name, status.as_str()),
        )
        .with_kind(NotificationType::Success)
        .related_to(report_id),
    )
    .await?;
    txn.commit().await?;
    Ok(updated)
}

/// A farmer's most recent reports, newest first.
pub async fn list_reports_for_farmer(
    db: &DatabaseConnection,
    farmer_id: i64,
    limit: u64,
) -> Result<Vec<disease_report::Model>> {
    DiseaseReport::find()
        .filter(disease_report::Column::FarmerId.eq(farmer_id))
        .order_by_desc(disease_report::Column::CreatedAt)
        .order_by_desc(disease_report::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Reports waiting for an officer, oldest first.
pub async fn list_pending_reports(db: &DatabaseConnection) -> Result<Vec<disease_report::Model>> {
    DiseaseReport::find()
        .filter(disease_report::Column::Status.eq(ReportStatus::Pending))
        .order_by_asc(disease_report::Column::CreatedAt)
        .order_by_asc(disease_report::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
