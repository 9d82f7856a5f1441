//! Enum finalization

use heck::ToShoutySnakeCase;

use crate::error::Result;
use crate::model::{EnumConstant, PackageSet, TypeDecl};
use crate::passes::PassContext;

/// Bring enums into proto3 shape: constants prefixed with the shouty enum
/// name, and a zero `*_UNSPECIFIED` sentinel inserted first. A source value
/// literally named "unspecified" gets an `EnumValue` suffix so it cannot
/// collide with the sentinel.
pub fn finalize_enums(set: &mut PackageSet, _ctx: &mut PassContext) -> Result<()> {
    set.for_each_type_mut(|_, decl| {
        if let TypeDecl::Enum(en) = decl {
            let prefix = en.name.to_shouty_snake_case();
            let sentinel = format!("{}_UNSPECIFIED", prefix);

            // Already finalized.
            if en
                .constants
                .first()
                .map(|c| c.number == 0 && c.name == sentinel)
                .unwrap_or(false)
            {
                return;
            }

            for constant in en.constants.iter_mut() {
                constant.name = constant_name(&prefix, &constant.name);
            }
            en.constants.insert(
                0,
                EnumConstant {
                    name: sentinel,
                    number: 0,
                    documentation: None,
                },
            );
        }
    });
    Ok(())
}

fn constant_name(prefix: &str, value: &str) -> String {
    let mut value = value.replace('+', "plus").replace('-', "minus");
    if value.eq_ignore_ascii_case("unspecified") {
        value.push_str("EnumValue");
    }
    format!("{}_{}", prefix, value.to_shouty_snake_case())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConverterConfig;
    use crate::mapper::NameMapper;
    use crate::model::EnumType;

    fn enum_set(constants: &[&str]) -> PackageSet {
        let mut set = PackageSet::new();
        let pkg = set.entry("org.example");
        let mut en = EnumType::new("Status");
        for (i, name) in constants.iter().enumerate() {
            en.constants.push(EnumConstant {
                name: name.to_string(),
                number: (i + 1) as i32,
                documentation: None,
            });
        }
        pkg.types.push(TypeDecl::Enum(en));
        set
    }

    fn run(set: &mut PackageSet) {
        let config = ConverterConfig::default();
        let mapper = NameMapper::default();
        let mut ctx = PassContext::new(&config, &mapper);
        finalize_enums(set, &mut ctx).unwrap();
    }

    #[test]
    fn constants_are_prefixed_and_sentinel_inserted() {
        let mut set = enum_set(&["open", "closed"]);
        run(&mut set);

        let status = set.get("org.example").unwrap().enum_type("Status").unwrap();
        let names: Vec<_> = status.constants.iter().map(|c| (c.name.as_str(), c.number)).collect();
        assert_eq!(
            names,
            vec![
                ("STATUS_UNSPECIFIED", 0),
                ("STATUS_OPEN", 1),
                ("STATUS_CLOSED", 2)
            ]
        );
    }

    #[test]
    fn finalization_is_idempotent() {
        let mut set = enum_set(&["open"]);
        run(&mut set);
        run(&mut set);

        let status = set.get("org.example").unwrap().enum_type("Status").unwrap();
        assert_eq!(status.constants.len(), 2);
        assert_eq!(status.constants[0].name, "STATUS_UNSPECIFIED");
    }

    #[test]
    fn literal_unspecified_value_is_disambiguated() {
        let mut set = enum_set(&["unspecified", "known"]);
        run(&mut set);

        let status = set.get("org.example").unwrap().enum_type("Status").unwrap();
        assert_eq!(status.constants[0].name, "STATUS_UNSPECIFIED");
        assert_eq!(status.constants[1].name, "STATUS_UNSPECIFIED_ENUM_VALUE");
        assert_eq!(status.constants[2].name, "STATUS_KNOWN");
    }

    #[test]
    fn signs_are_spelled_out() {
        let mut set = enum_set(&["+1", "-1"]);
        run(&mut set);

        let status = set.get("org.example").unwrap().enum_type("Status").unwrap();
        assert_eq!(status.constants[1].name, "STATUS_PLUS1");
        assert_eq!(status.constants[2].name, "STATUS_MINUS1");
    }
}
