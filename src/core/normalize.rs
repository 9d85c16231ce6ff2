use crate::io::manifest;
use crate::types::{
    PlanError, PlanResult, Platform, PolarizationMode, SceneRecord,
};
use chrono::NaiveDateTime;
use std::path::Path;

/// Number of underscore tokens a scene name must provide (through the unique
/// id), part of the acquisition-catalog naming convention
const MIN_NAME_TOKENS: usize = 9;

/// Orbit repeat cycle of the Sentinel-1 constellation
const ORBIT_CYCLE: i64 = 175;

/// Parses one catalog identifier into a `SceneRecord`.
///
/// The identifier is a path to a `.SAFE` directory whose last segment is the
/// scene name, e.g.
/// `S1A_IW_SLC__1SDV_20200103T170815_20200103T170842_030639_0382D5_DADE.SAFE`.
/// Tokenization is positional over underscore-delimited segments (double
/// underscores collapsed first); this is a fixed external contract.
pub fn parse_scene(identifier: &str) -> PlanResult<SceneRecord> {
    let trimmed = identifier.trim_end_matches('/');
    let name = trimmed
        .rsplit('/')
        .next()
        .ok_or_else(|| PlanError::MalformedIdentifier(identifier.to_string()))?;
    let name = name.replace("__", "_");
    let tokens: Vec<&str> = name.split('_').collect();
    if tokens.len() < MIN_NAME_TOKENS {
        return Err(PlanError::MalformedIdentifier(format!(
            "{} ({} tokens, expected {})",
            identifier,
            tokens.len(),
            MIN_NAME_TOKENS
        )));
    }

    let platform = match tokens[0] {
        "S1A" => Platform::S1A,
        "S1B" => Platform::S1B,
        other => {
            return Err(PlanError::MalformedIdentifier(format!(
                "unknown platform {} in {}",
                other, identifier
            )))
        }
    };

    let polarization = if tokens[3] == "1SDH" {
        PolarizationMode::DualHH
    } else {
        PolarizationMode::DualVV
    };

    let start_time = parse_timestamp(tokens[4], identifier)?;
    let stop_time = parse_timestamp(tokens[5], identifier)?;

    let absolute_orbit: u32 = tokens[6].parse().map_err(|_| {
        PlanError::MalformedIdentifier(format!(
            "bad absolute orbit {} in {}",
            tokens[6], identifier
        ))
    })?;

    let unique_id = tokens[8].replace(".SAFE", "");

    Ok(SceneRecord {
        path: trimmed.to_string(),
        platform,
        polarization,
        start_time,
        stop_time,
        absolute_orbit,
        relative_orbit: relative_orbit(platform, absolute_orbit),
        orbit_direction: manifest::orbit_direction(Path::new(trimmed)),
        unique_id,
    })
}

fn parse_timestamp(token: &str, identifier: &str) -> PlanResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(token, "%Y%m%dT%H%M%S").map_err(|_| {
        PlanError::MalformedIdentifier(format!("bad timestamp {} in {}", token, identifier))
    })
}

/// Relative orbit (ground track) from the absolute orbit counter.
///
/// Mathematical modulo keeps the result in 1..=175 even for absolute orbits
/// below the platform bias, where a float remainder would go negative.
pub fn relative_orbit(platform: Platform, absolute_orbit: u32) -> u32 {
    let biased = absolute_orbit as i64 - platform.orbit_bias();
    (biased.rem_euclid(ORBIT_CYCLE) + 1) as u32
}

/// Normalizes all identifiers, skipping malformed entries so one bad record
/// never aborts the batch
pub fn normalize_all(tiles: &[String]) -> Vec<SceneRecord> {
    let mut records = Vec::with_capacity(tiles.len());
    for tile in tiles {
        match parse_scene(tile) {
            Ok(record) => records.push(record),
            Err(e) => log::warn!("skipping record: {}", e),
        }
    }
    log::info!("normalized {} of {} identifiers", records.len(), tiles.len());
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrbitDirection;

    const SCENE: &str =
        "/data/S1A_IW_SLC__1SDV_20200103T170815_20200103T170842_030639_0382D5_DADE.SAFE";

    #[test]
    fn test_parse_scene_fields() {
        let record = parse_scene(SCENE).unwrap();
        assert_eq!(record.platform, Platform::S1A);
        assert_eq!(record.polarization, PolarizationMode::DualVV);
        assert_eq!(record.date_token(), "20200103");
        assert_eq!(record.hour_token(), "17");
        assert_eq!(record.absolute_orbit, 30639);
        assert_eq!(record.unique_id, "DADE");
        assert_eq!(record.path, SCENE);
        // no manifest on disk: direction degrades to unknown
        assert_eq!(record.orbit_direction, OrbitDirection::Unknown);
    }

    #[test]
    fn test_parse_cross_pol_scene() {
        let scene =
            "/data/S1B_IW_SLC__1SDH_20200103T170815_20200103T170842_019568_0382D5_AB01.SAFE";
        let record = parse_scene(scene).unwrap();
        assert_eq!(record.platform, Platform::S1B);
        assert_eq!(record.polarization, PolarizationMode::DualHH);
    }

    #[test]
    fn test_malformed_identifier() {
        assert!(matches!(
            parse_scene("/data/S1A_broken"),
            Err(PlanError::MalformedIdentifier(_))
        ));
        assert!(matches!(
            parse_scene(
                "/data/S9X_IW_SLC__1SDV_20200103T170815_20200103T170842_030639_0382D5_DADE.SAFE"
            ),
            Err(PlanError::MalformedIdentifier(_))
        ));
    }

    #[test]
    fn test_relative_orbit_fixed_points() {
        assert_eq!(relative_orbit(Platform::S1A, 73), 1);
        assert_eq!(relative_orbit(Platform::S1A, 247), 175);
        assert_eq!(relative_orbit(Platform::S1A, 248), 1);
        assert_eq!(relative_orbit(Platform::S1B, 27), 1);
    }

    #[test]
    fn test_relative_orbit_below_bias_wraps() {
        // absolute orbit below the platform bias must stay in 1..=175
        assert_eq!(relative_orbit(Platform::S1A, 72), 175);
        assert_eq!(relative_orbit(Platform::S1A, 0), 103);
    }

    #[test]
    fn test_normalize_all_skips_malformed() {
        let tiles = vec![SCENE.to_string(), "/data/garbage".to_string()];
        let records = normalize_all(&tiles);
        assert_eq!(records.len(), 1);
    }
}
