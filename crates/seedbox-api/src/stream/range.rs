//! Serving a file with single-range support.
//!
//! At most one `bytes=` range is honored. Anything else (several ranges,
//! other units, unsatisfiable or malformed values) degrades to the full
//! entity with status 200; an unusable `Range` header is never an error.
//!
//! The body pulls from a bounded file reader, so a stalled client pauses
//! disk reads and a dropped connection closes the file.

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;
use tokio_util::io::ReaderStream;
use tracing::debug;

use seedbox_core::error::AppError;
use seedbox_core::result::AppResult;
use seedbox_entity::delivery::Disposition;
use seedbox_service::link::builder::encode_component;
use seedbox_storage::{FileMeta, LocalSandbox};

const READ_CHUNK: usize = 64 * 1024;

/// One parsed byte range, before it is checked against the entity length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedRange {
    /// `bytes=start-end` or the open-ended `bytes=start-`.
    StartEnd {
        start: u64,
        end_inclusive: Option<u64>,
    },
    /// `bytes=-len`: the last `len` bytes.
    Suffix { len: u64 },
}

/// Parse a Range header value. `None` for anything but one byte range.
pub fn parse_range_header(value: &str) -> Option<ParsedRange> {
    let rest = value.trim().strip_prefix("bytes=")?;
    if rest.contains(',') {
        return None;
    }
    let (start_str, end_str) = rest.split_once('-')?;
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        let len: u64 = end_str.parse().ok()?;
        if len == 0 {
            return None;
        }
        Some(ParsedRange::Suffix { len })
    } else {
        let start: u64 = start_str.parse().ok()?;
        let end_inclusive = if end_str.is_empty() {
            None
        } else {
            Some(end_str.parse::<u64>().ok()?)
        };
        Some(ParsedRange::StartEnd { start, end_inclusive })
    }
}

impl ParsedRange {
    /// Inclusive `(start, end)` within an entity of `total` bytes, clamping
    /// `end` to the last byte. `None` if the range cannot be satisfied.
    pub fn resolve(self, total: u64) -> Option<(u64, u64)> {
        if total == 0 {
            return None;
        }
        let last = total - 1;
        match self {
            ParsedRange::StartEnd { start, end_inclusive } => {
                let end = end_inclusive.map_or(last, |e| e.min(last));
                (start <= end).then_some((start, end))
            }
            ParsedRange::Suffix { len } => Some((total - len.min(total), last)),
        }
    }
}

/// What a response will carry: which bytes, and whether it is partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPlan {
    pub start: u64,
    pub len: u64,
    pub total: u64,
    pub partial: bool,
}

impl DeliveryPlan {
    /// Decide the bytes to send for `total` and an optional Range header.
    pub fn new(total: u64, range_header: Option<&str>) -> Self {
        match range_header
            .and_then(parse_range_header)
            .and_then(|r| r.resolve(total))
        {
            Some((start, end)) => Self {
                start,
                len: end - start + 1,
                total,
                partial: true,
            },
            None => Self {
                start: 0,
                len: total,
                total,
                partial: false,
            },
        }
    }

    /// Inclusive last byte.
    pub fn end(&self) -> u64 {
        (self.start + self.len).saturating_sub(1)
    }
}

/// Builds range-aware responses for sandbox files.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeStreamer;

impl RangeStreamer {
    /// Serve `file` from `sandbox`.
    ///
    /// The file is opened before any header is produced, so open failures
    /// surface as ordinary error responses.
    pub async fn serve(
        sandbox: &LocalSandbox,
        file: &FileMeta,
        range_header: Option<&str>,
        disposition: Disposition,
    ) -> AppResult<Response> {
        let plan = DeliveryPlan::new(file.size, range_header);
        let reader = sandbox.open_range(file, plan.start, plan.len).await?;

        debug!(
            path = %file.relative,
            start = plan.start,
            len = plan.len,
            total = plan.total,
            partial = plan.partial,
            "Serving bytes"
        );

        let body = Body::from_stream(ReaderStream::with_capacity(reader, READ_CHUNK));
        Self::response(&plan, &file.mime, &file.name, disposition, body)
    }

    /// Assemble status and headers for `plan` around `body`.
    pub fn response(
        plan: &DeliveryPlan,
        mime: &str,
        filename: &str,
        disposition: Disposition,
        body: Body,
    ) -> AppResult<Response> {
        let content_type = HeaderValue::from_str(mime)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

        let mut builder = Response::builder()
            .header(header::ACCEPT_RANGES, "bytes")
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_LENGTH, plan.len);

        if plan.partial {
            builder = builder.status(StatusCode::PARTIAL_CONTENT).header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", plan.start, plan.end(), plan.total),
            );
        } else {
            builder = builder.status(StatusCode::OK);
        }

        if disposition.is_attachment() {
            builder = builder.header(
                header::CONTENT_DISPOSITION,
                format!("attachment; filename*=UTF-8''{}", encode_component(filename)),
            );
        }

        builder
            .body(body)
            .map_err(|e| AppError::internal(format!("Response build failed: {e}")))
    }
}
