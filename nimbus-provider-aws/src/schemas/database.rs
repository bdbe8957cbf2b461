//! Schemas for the database tier: RDS subnet group, parameter group and
//! instance

use nimbus_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

pub(super) fn schemas() -> Vec<ResourceSchema> {
    vec![db_subnet_group(), db_parameter_group(), db_instance()]
}

fn tags() -> AttributeSchema {
    AttributeSchema::new("tags", AttributeType::Map(Box::new(AttributeType::String)))
}

fn db_subnet_group() -> ResourceSchema {
    ResourceSchema::new("db_subnet_group")
        .attribute(
            AttributeSchema::new("db_subnet_group_name", AttributeType::String)
                .required()
                .with_provider_name("DBSubnetGroupName"),
        )
        .attribute(
            AttributeSchema::new("description", AttributeType::String)
                .required()
                .with_provider_name("DBSubnetGroupDescription"),
        )
        .attribute(
            AttributeSchema::new("subnet_ids", AttributeType::List(Box::new(AttributeType::String)))
                .required()
                .with_provider_name("SubnetIds"),
        )
        .attribute(tags())
}

fn db_parameter_group() -> ResourceSchema {
    ResourceSchema::new("db_parameter_group")
        .attribute(
            AttributeSchema::new("db_parameter_group_name", AttributeType::String)
                .required()
                .with_provider_name("DBParameterGroupName"),
        )
        .attribute(
            AttributeSchema::new("family", AttributeType::String)
                .required()
                .with_description("Engine family, e.g. mysql8.0 or postgres16")
                .with_provider_name("Family"),
        )
        .attribute(
            AttributeSchema::new("description", AttributeType::String)
                .required()
                .with_provider_name("Description"),
        )
        .attribute(tags())
}

fn db_instance() -> ResourceSchema {
    ResourceSchema::new("db_instance")
        .attribute(
            AttributeSchema::new("db_instance_identifier", AttributeType::String)
                .required()
                .with_provider_name("DBInstanceIdentifier"),
        )
        .attribute(
            AttributeSchema::new(
                "engine",
                AttributeType::Enum(vec![
                    "mysql".to_string(),
                    "mariadb".to_string(),
                    "postgres".to_string(),
                ]),
            )
            .required()
            .with_provider_name("Engine"),
        )
        .attribute(
            AttributeSchema::new("engine_version", AttributeType::String)
                .with_provider_name("EngineVersion"),
        )
        .attribute(
            AttributeSchema::new("db_instance_class", AttributeType::String)
                .required()
                .with_provider_name("DBInstanceClass"),
        )
        .attribute(
            AttributeSchema::new("allocated_storage", AttributeType::String)
                .with_description("CloudFormation models storage as a string of gigabytes")
                .with_provider_name("AllocatedStorage"),
        )
        .attribute(
            AttributeSchema::new("db_name", AttributeType::String).with_provider_name("DBName"),
        )
        .attribute(
            AttributeSchema::new("master_username", AttributeType::String)
                .required()
                .with_provider_name("MasterUsername"),
        )
        .attribute(
            AttributeSchema::new("master_user_password", AttributeType::String)
                .required()
                .with_provider_name("MasterUserPassword"),
        )
        .attribute(
            AttributeSchema::new("publicly_accessible", AttributeType::Bool)
                .with_provider_name("PubliclyAccessible"),
        )
        .attribute(
            AttributeSchema::new("multi_az", AttributeType::Bool).with_provider_name("MultiAZ"),
        )
        .attribute(
            AttributeSchema::new(
                "vpc_security_groups",
                AttributeType::List(Box::new(AttributeType::String)),
            )
            .with_provider_name("VPCSecurityGroups"),
        )
        .attribute(
            AttributeSchema::new("db_subnet_group_name", AttributeType::String)
                .with_provider_name("DBSubnetGroupName"),
        )
        .attribute(
            AttributeSchema::new("db_parameter_group_name", AttributeType::String)
                .with_provider_name("DBParameterGroupName"),
        )
        .attribute(tags())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use nimbus_core::resource::Value;

    use super::*;

    #[test]
    fn db_instance_rejects_unknown_engine() {
        let schema = db_instance();
        let mut attrs = HashMap::new();
        attrs.insert("db_instance_identifier".to_string(), Value::string("demo-db"));
        attrs.insert("engine".to_string(), Value::string("oracle"));
        attrs.insert("db_instance_class".to_string(), Value::string("db.t3.micro"));
        attrs.insert("master_username".to_string(), Value::string("admin"));
        attrs.insert("master_user_password".to_string(), Value::string("secret"));
        assert!(schema.validate(&attrs).is_err());

        attrs.insert("engine".to_string(), Value::string("postgres"));
        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn subnet_group_requires_subnet_ids() {
        let schema = db_subnet_group();
        let mut attrs = HashMap::new();
        attrs.insert("db_subnet_group_name".to_string(), Value::string("demo-db-subnets"));
        attrs.insert("description".to_string(), Value::string("private subnets"));
        assert!(schema.validate(&attrs).is_err());

        attrs.insert(
            "subnet_ids".to_string(),
            Value::List(vec![Value::reference("private_subnet_0", "subnet_id")]),
        );
        assert!(schema.validate(&attrs).is_ok());
    }
}
