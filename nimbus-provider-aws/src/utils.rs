//! Case conversion between nimbus attribute names and CloudFormation
//! property names
//!
//! Nimbus uses snake_case (`cidr_block`, `launch_template_data`);
//! CloudFormation uses PascalCase (`CidrBlock`, `LaunchTemplateData`).
//! Top-level attributes go through the per-resource mapping tables, which
//! also cover the irregular names (`VPCZoneIdentifier`, `DNSName`); nested
//! map keys are converted mechanically with these helpers.

/// Convert snake_case to PascalCase
/// e.g., "cidr_block" -> "CidrBlock"
pub fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}

/// Convert PascalCase to snake_case
/// e.g., "CidrBlock" -> "cidr_block"
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case() {
        assert_eq!(to_pascal_case("cidr_block"), "CidrBlock");
        assert_eq!(to_pascal_case("map_public_ip_on_launch"), "MapPublicIpOnLaunch");
        assert_eq!(to_pascal_case("ebs"), "Ebs");
        assert_eq!(to_pascal_case("propagate_at_launch"), "PropagateAtLaunch");
    }

    #[test]
    fn snake_case() {
        assert_eq!(to_snake_case("CidrBlock"), "cidr_block");
        assert_eq!(to_snake_case("VolumeSize"), "volume_size");
        assert_eq!(to_snake_case("Ebs"), "ebs");
    }

    #[test]
    fn round_trip() {
        for name in ["image_id", "user_data", "block_device_mappings", "version"] {
            assert_eq!(to_snake_case(&to_pascal_case(name)), name);
        }
    }
}
