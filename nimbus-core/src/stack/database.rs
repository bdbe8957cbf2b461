//! Database tier - RDS instance in the private subnets

use crate::config::{DatabaseConfig, StackConfig};
use crate::resource::{Resource, Value};

use super::{binding, tags};

pub fn build(config: &StackConfig, db: &DatabaseConfig, subnet_count: usize) -> Vec<Resource> {
    let stack = &config.stack_name;
    let mut out = Vec::new();

    let private_subnet_ids = Value::List(
        (0..subnet_count)
            .map(|i| Value::reference(binding::private_subnet(i), "subnet_id"))
            .collect(),
    );

    let subnet_group_name = format!("{}-db-subnets", stack);
    out.push(
        Resource::new("db_subnet_group", &subnet_group_name)
            .with_binding(binding::DB_SUBNET_GROUP)
            .with_attribute("db_subnet_group_name", Value::string(&subnet_group_name))
            .with_attribute(
                "description",
                Value::string("Private subnets for the database tier"),
            )
            .with_attribute("subnet_ids", private_subnet_ids)
            .with_attribute("tags", tags(config, &subnet_group_name)),
    );

    let parameter_group_name = format!("{}-db-params", stack);
    out.push(
        Resource::new("db_parameter_group", &parameter_group_name)
            .with_binding(binding::DB_PARAMETER_GROUP)
            .with_attribute("db_parameter_group_name", Value::string(&parameter_group_name))
            .with_attribute(
                "family",
                Value::string(db.engine.parameter_group_family(&db.engine_version)),
            )
            .with_attribute(
                "description",
                Value::string(format!("Parameters for {}", db.engine.as_str())),
            )
            .with_attribute("tags", tags(config, &parameter_group_name)),
    );

    let instance_name = format!("{}-db", stack);
    out.push(
        Resource::new("db_instance", &instance_name)
            .with_binding(binding::DB_INSTANCE)
            .with_attribute("db_instance_identifier", Value::string(&instance_name))
            .with_attribute("engine", Value::string(db.engine.as_str()))
            .with_attribute("engine_version", Value::string(&db.engine_version))
            .with_attribute("db_instance_class", Value::string(&db.instance_class))
            // CloudFormation models allocated storage as a string
            .with_attribute(
                "allocated_storage",
                Value::string(db.allocated_storage_gb.to_string()),
            )
            .with_attribute("db_name", Value::string(&db.db_name))
            .with_attribute("master_username", Value::string(&db.username))
            .with_attribute("master_user_password", Value::string(&db.password))
            .with_attribute("publicly_accessible", Value::Bool(false))
            .with_attribute("multi_az", Value::Bool(false))
            .with_attribute(
                "vpc_security_groups",
                Value::List(vec![Value::reference(binding::DB_SG, "group_id")]),
            )
            .with_attribute(
                "db_subnet_group_name",
                Value::reference(binding::DB_SUBNET_GROUP, "db_subnet_group_name"),
            )
            .with_attribute(
                "db_parameter_group_name",
                Value::reference(binding::DB_PARAMETER_GROUP, "db_parameter_group_name"),
            )
            .with_attribute("tags", tags(config, &instance_name)),
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::sample_config;

    fn build_database() -> Vec<Resource> {
        let config = sample_config();
        let db = config.database.clone().unwrap();
        build(&config, &db, 3)
    }

    #[test]
    fn subnet_group_covers_private_subnets() {
        let resources = build_database();
        let group = resources
            .iter()
            .find(|r| r.id.resource_type == "db_subnet_group")
            .unwrap();
        match group.attributes.get("subnet_ids") {
            Some(Value::List(ids)) => {
                assert_eq!(ids.len(), 3);
                assert_eq!(ids[0], Value::reference("private_subnet_0", "subnet_id"));
            }
            other => panic!("Expected subnet id list, got {:?}", other),
        }
    }

    #[test]
    fn parameter_group_family_follows_engine() {
        let resources = build_database();
        let group = resources
            .iter()
            .find(|r| r.id.resource_type == "db_parameter_group")
            .unwrap();
        assert_eq!(
            group.attributes.get("family"),
            Some(&Value::string("mysql8.0"))
        );
    }

    #[test]
    fn instance_is_private() {
        let resources = build_database();
        let instance = resources
            .iter()
            .find(|r| r.id.resource_type == "db_instance")
            .unwrap();
        assert_eq!(
            instance.attributes.get("publicly_accessible"),
            Some(&Value::Bool(false))
        );
        assert_eq!(
            instance.attributes.get("allocated_storage"),
            Some(&Value::string("20"))
        );
        assert_eq!(
            instance.attributes.get("vpc_security_groups"),
            Some(&Value::List(vec![Value::reference(
                binding::DB_SG,
                "group_id"
            )]))
        );
    }
}
