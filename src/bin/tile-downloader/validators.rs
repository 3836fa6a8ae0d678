use tile_downloader::{Fixture, MAX_LOD};

pub fn is_numeric_min(min: usize) -> impl Fn(&str) -> Result<usize, String> + Clone {
    move |v: &str| {
        let val = v
            .parse::<usize>()
            .map_err(|_| "must be numeric".to_owned())?;

        if val < min {
            return Err(format!("must be >= {}", min));
        }

        Ok(val)
    }
}

pub fn is_lod(v: &str) -> Result<u8, String> {
    let val = v.parse::<u8>().map_err(|_| "must be numeric".to_owned())?;

    if val > MAX_LOD {
        return Err(format!("must be <= {}", MAX_LOD));
    }

    Ok(val)
}

pub fn is_geo_coord(v: &str) -> Result<f64, String> {
    let val = v.parse::<f64>().map_err(|_| "must be numeric".to_owned())?;

    if !val.is_finite() {
        return Err("must be finite".to_owned());
    }

    Ok(val)
}

pub fn is_bb_fixture(v: &str) -> Result<Fixture, String> {
    v.parse::<Fixture>().map_err(|_| "invalid fixture".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_min() {
        let validator = is_numeric_min(1);
        assert_eq!(validator("4"), Ok(4));
        assert!(validator("0").is_err());
        assert!(validator("four").is_err());
    }

    #[test]
    fn lod() {
        assert_eq!(is_lod("0"), Ok(0));
        assert_eq!(is_lod("30"), Ok(30));
        assert!(is_lod("31").is_err());
        assert!(is_lod("-1").is_err());
    }

    #[test]
    fn geo_coord() {
        assert_eq!(is_geo_coord("-85.5"), Ok(-85.5));
        // out of range values are clamped later on
        assert_eq!(is_geo_coord("200"), Ok(200.0));
        assert!(is_geo_coord("NaN").is_err());
        assert!(is_geo_coord("north").is_err());
    }

    #[test]
    fn fixture() {
        assert_eq!(is_bb_fixture("usa"), Ok(Fixture::USA));
        assert!(is_bb_fixture("mars").is_err());
    }
}
