//! Request and response types for the REST surface.
//!
//! Albums themselves travel as `catalog_core::Album` and
//! `catalog_core::AlbumInput`; this module only holds the extra shapes the
//! HTTP layer needs.

use serde::{Deserialize, Serialize};

/// Header carrying the unpaged album count on `GET /albums`.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Query parameters for `GET /albums`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema, utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ListAlbumsParams {
    /// Maximum number of albums to return (0 or absent = all)
    pub limit: Option<usize>,
    /// Number of albums to skip
    pub offset: Option<usize>,
}
