//! HTTP route handlers.

pub mod catalog;
pub mod execute;
pub mod tables;

use refdata_core::CalendarDate;

use crate::context::RequestContext;
use crate::error::ApiError;

/// Parses the year/month/day path segments into a [`CalendarDate`].
///
/// Non-numeric or out-of-bounds components are a 400 carrying the request
/// ID for correlation.
pub(crate) fn parse_date(
    ctx: &RequestContext,
    year: &str,
    month: &str,
    day: &str,
) -> Result<CalendarDate, ApiError> {
    CalendarDate::from_segments(year, month, day)
        .map_err(|err| ApiError::from(err).with_request_id(ctx.request_id.clone()))
}
