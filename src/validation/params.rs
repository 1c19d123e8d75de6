use crate::core::error::ValidationError;
use crate::models::api::TorrentInfoQuery;
use crate::models::reference::TorrentReference;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTorrentInfoParams {
    pub reference: TorrentReference,
    pub hops: u32,
}

impl TorrentInfoQuery {
    /// Validate `uri` and `hops` before anything is fetched
    pub fn validate(self, max_hops: u32) -> Result<ValidatedTorrentInfoParams, ValidationError> {
        let uri = self
            .uri
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| ValidationError::MissingParameter("uri".to_string()))?;

        let hops = match self.hops {
            Some(hops) => validate_hops(&hops, max_hops)?,
            None => 0,
        };

        let reference = TorrentReference::parse(&uri)?;

        Ok(ValidatedTorrentInfoParams { reference, hops })
    }
}

/// Hops must be a non-negative integer no larger than `max_hops`
pub fn validate_hops(raw: &str, max_hops: u32) -> Result<u32, ValidationError> {
    let raw = raw.trim();

    let hops = raw
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidHops(format!("'{}' is not a non-negative integer", raw)))?;

    if hops > max_hops {
        return Err(ValidationError::InvalidHops(format!(
            "{} exceeds the maximum of {}",
            hops, max_hops
        )));
    }

    Ok(hops)
}
