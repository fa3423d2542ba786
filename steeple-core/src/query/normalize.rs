//! Query normalization: raw JSON payload to validated [`SearchQuery`].
//!
//! Pure validation. No query is produced unless every field required by
//! the selected variant is present and in range, so nothing partial ever
//! reaches a backend.

use serde_json::{Map, Value};

use super::fields::Fields;
use super::{
    BBoxCriteria, BoundingBox, GeoPoint, NearbyCriteria, OutputMode, RadiusCriteria,
    SearchCriteria, SearchQuery, TextCriteria, TextFilters, Variant,
};
use crate::config::QueryLimits;
use crate::errors::ValidationError;
use crate::record::BeliefType;

/// Validates untyped search payloads against the configured [`QueryLimits`].
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryNormalizer {
    limits: QueryLimits,
}

impl QueryNormalizer {
    /// Creates a normalizer enforcing `limits`.
    pub fn new(limits: QueryLimits) -> Self {
        Self { limits }
    }

    /// Normalizes a whole request body, reading `_variant` and `_output` from it.
    ///
    /// `forced_output` overrides `_output`, for endpoints with a fixed shape.
    ///
    /// # Errors
    /// - `ValidationError` - Discriminators or variant fields are invalid
    pub fn normalize_request(
        &self,
        payload: &Map<String, Value>,
        forced_output: Option<OutputMode>,
    ) -> Result<SearchQuery, ValidationError> {
        let variant = Variant::from_payload(payload)?;
        let output = match forced_output {
            Some(output) => output,
            None => OutputMode::from_payload(payload)?,
        };
        self.normalize(payload, variant, output)
    }

    /// Normalizes `payload` as the given variant. Unknown keys are ignored.
    ///
    /// # Errors
    /// - `ValidationError` - A required field is missing or any field is invalid
    pub fn normalize(
        &self,
        payload: &Map<String, Value>,
        variant: Variant,
        output: OutputMode,
    ) -> Result<SearchQuery, ValidationError> {
        let fields = Fields::new(payload);
        let criteria = match variant {
            Variant::Text => SearchCriteria::Text(self.text(&fields)?),
            Variant::Radius => SearchCriteria::Radius(self.radius(&fields)?),
            Variant::BBox => SearchCriteria::BBox(self.bbox(&fields)?),
            Variant::Nearby => SearchCriteria::Nearby(self.nearby(&fields)?),
        };
        Ok(SearchQuery::new(criteria, output))
    }

    fn text(&self, fields: &Fields<'_>) -> Result<TextCriteria, ValidationError> {
        let belief_type = fields
            .optional_string("belief_type")?
            .map(|raw| {
                raw.parse::<BeliefType>()
                    .map_err(|reason| ValidationError::invalid_value("belief_type", reason))
            })
            .transpose()?;

        let filters = TextFilters {
            belief_type,
            languages: fields.string_list("languages")?,
            country: fields.optional_string("country")?,
            region: fields.optional_string("region")?,
            locality: fields.optional_string("locality")?,
        };

        Ok(TextCriteria {
            term: fields.optional_string("q")?,
            filters,
            limit: self.limit(fields, Variant::Text)?,
            offset: fields.optional_u32("offset")?.unwrap_or(0),
        })
    }

    fn radius(&self, fields: &Fields<'_>) -> Result<RadiusCriteria, ValidationError> {
        let center = point(fields, "lng", "lat")?;

        let radius_m = fields.required_f64("radius_m")?;
        if radius_m <= 0.0 {
            return Err(ValidationError::out_of_range(
                "radius_m",
                format!("{radius_m} must be greater than 0"),
            ));
        }
        if radius_m > self.limits.max_radius_m {
            return Err(ValidationError::out_of_range(
                "radius_m",
                format!("{radius_m} exceeds maximum of {}", self.limits.max_radius_m),
            ));
        }

        Ok(RadiusCriteria {
            center,
            radius_m,
            limit: self.limit(fields, Variant::Radius)?,
        })
    }

    fn bbox(&self, fields: &Fields<'_>) -> Result<BBoxCriteria, ValidationError> {
        let min_lng = longitude(fields, "minLng")?;
        let min_lat = latitude(fields, "minLat")?;
        let max_lng = longitude(fields, "maxLng")?;
        let max_lat = latitude(fields, "maxLat")?;

        if min_lng > max_lng {
            return Err(ValidationError::inverted_range("minLng", "maxLng"));
        }
        if min_lat > max_lat {
            return Err(ValidationError::inverted_range("minLat", "maxLat"));
        }

        Ok(BBoxCriteria {
            bounds: BoundingBox {
                min_lng,
                min_lat,
                max_lng,
                max_lat,
            },
            limit: self.limit(fields, Variant::BBox)?,
        })
    }

    fn nearby(&self, fields: &Fields<'_>) -> Result<NearbyCriteria, ValidationError> {
        Ok(NearbyCriteria {
            center: point(fields, "lng", "lat")?,
            limit: self.limit(fields, Variant::Nearby)?,
        })
    }

    /// Default applies only when `limit` is absent; a present bad value fails.
    fn limit(&self, fields: &Fields<'_>, variant: Variant) -> Result<u32, ValidationError> {
        let Some(limit) = fields.optional_u32("limit")? else {
            return Ok(variant.default_limit());
        };
        if limit == 0 || limit > self.limits.max_limit {
            return Err(ValidationError::out_of_range(
                "limit",
                format!("{limit} must be between 1 and {}", self.limits.max_limit),
            ));
        }
        Ok(limit)
    }
}

fn point(fields: &Fields<'_>, lng: &str, lat: &str) -> Result<GeoPoint, ValidationError> {
    Ok(GeoPoint {
        lng: longitude(fields, lng)?,
        lat: latitude(fields, lat)?,
    })
}

fn longitude(fields: &Fields<'_>, name: &str) -> Result<f64, ValidationError> {
    bounded(fields, name, 180.0)
}

fn latitude(fields: &Fields<'_>, name: &str) -> Result<f64, ValidationError> {
    bounded(fields, name, 90.0)
}

fn bounded(fields: &Fields<'_>, name: &str, bound: f64) -> Result<f64, ValidationError> {
    let value = fields.required_f64(name)?;
    if !(-bound..=bound).contains(&value) {
        return Err(ValidationError::out_of_range(
            name,
            format!("{value} is outside [-{bound}, {bound}]"),
        ));
    }
    Ok(value)
}
