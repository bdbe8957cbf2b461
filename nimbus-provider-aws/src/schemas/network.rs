//! Schemas for the network tier: VPC, subnets, gateway, routing and
//! security groups

use nimbus_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

pub(super) fn schemas() -> Vec<ResourceSchema> {
    vec![
        vpc(),
        subnet(),
        internet_gateway(),
        vpc_gateway_attachment(),
        route_table(),
        route(),
        route_table_association(),
        security_group(),
        security_group_ingress(),
    ]
}

fn tags() -> AttributeSchema {
    AttributeSchema::new("tags", AttributeType::Map(Box::new(AttributeType::String)))
}

fn vpc() -> ResourceSchema {
    ResourceSchema::new("vpc")
        .with_description("An isolated virtual network")
        .attribute(
            AttributeSchema::new("cidr_block", types::cidr())
                .required()
                .with_provider_name("CidrBlock"),
        )
        .attribute(
            AttributeSchema::new(
                "instance_tenancy",
                AttributeType::Enum(vec!["default".to_string(), "dedicated".to_string()]),
            )
            .with_provider_name("InstanceTenancy"),
        )
        .attribute(
            AttributeSchema::new("enable_dns_support", AttributeType::Bool)
                .with_provider_name("EnableDnsSupport"),
        )
        .attribute(
            AttributeSchema::new("enable_dns_hostnames", AttributeType::Bool)
                .with_provider_name("EnableDnsHostnames"),
        )
        .attribute(tags())
}

fn subnet() -> ResourceSchema {
    ResourceSchema::new("subnet")
        .attribute(
            AttributeSchema::new("vpc_id", AttributeType::String)
                .required()
                .with_provider_name("VpcId"),
        )
        .attribute(
            AttributeSchema::new("cidr_block", types::cidr())
                .required()
                .with_provider_name("CidrBlock"),
        )
        .attribute(
            AttributeSchema::new("availability_zone", AttributeType::String)
                .with_provider_name("AvailabilityZone"),
        )
        .attribute(
            AttributeSchema::new("map_public_ip_on_launch", AttributeType::Bool)
                .with_provider_name("MapPublicIpOnLaunch"),
        )
        .attribute(tags())
}

fn internet_gateway() -> ResourceSchema {
    ResourceSchema::new("internet_gateway").attribute(tags())
}

fn vpc_gateway_attachment() -> ResourceSchema {
    ResourceSchema::new("vpc_gateway_attachment")
        .attribute(
            AttributeSchema::new("vpc_id", AttributeType::String)
                .required()
                .with_provider_name("VpcId"),
        )
        .attribute(
            AttributeSchema::new("internet_gateway_id", AttributeType::String)
                .required()
                .with_provider_name("InternetGatewayId"),
        )
}

fn route_table() -> ResourceSchema {
    ResourceSchema::new("route_table")
        .attribute(
            AttributeSchema::new("vpc_id", AttributeType::String)
                .required()
                .with_provider_name("VpcId"),
        )
        .attribute(tags())
}

fn route() -> ResourceSchema {
    ResourceSchema::new("route")
        .attribute(
            AttributeSchema::new("route_table_id", AttributeType::String)
                .required()
                .with_provider_name("RouteTableId"),
        )
        .attribute(
            AttributeSchema::new("destination_cidr_block", types::cidr())
                .required()
                .with_provider_name("DestinationCidrBlock"),
        )
        .attribute(
            AttributeSchema::new("gateway_id", AttributeType::String)
                .with_provider_name("GatewayId"),
        )
}

fn route_table_association() -> ResourceSchema {
    ResourceSchema::new("route_table_association")
        .attribute(
            AttributeSchema::new("subnet_id", AttributeType::String)
                .required()
                .with_provider_name("SubnetId"),
        )
        .attribute(
            AttributeSchema::new("route_table_id", AttributeType::String)
                .required()
                .with_provider_name("RouteTableId"),
        )
}

fn security_group() -> ResourceSchema {
    ResourceSchema::new("security_group")
        .attribute(
            AttributeSchema::new("group_name", AttributeType::String)
                .with_provider_name("GroupName"),
        )
        .attribute(
            AttributeSchema::new("description", AttributeType::String)
                .required()
                .with_description("CloudFormation requires a group description")
                .with_provider_name("GroupDescription"),
        )
        .attribute(
            AttributeSchema::new("vpc_id", AttributeType::String)
                .required()
                .with_provider_name("VpcId"),
        )
        .attribute(tags())
}

fn security_group_ingress() -> ResourceSchema {
    ResourceSchema::new("security_group_ingress")
        .attribute(
            AttributeSchema::new("security_group_id", AttributeType::String)
                .required()
                .with_provider_name("GroupId"),
        )
        .attribute(
            AttributeSchema::new("ip_protocol", AttributeType::String)
                .required()
                .with_provider_name("IpProtocol"),
        )
        .attribute(
            AttributeSchema::new("from_port", types::port()).with_provider_name("FromPort"),
        )
        .attribute(AttributeSchema::new("to_port", types::port()).with_provider_name("ToPort"))
        .attribute(AttributeSchema::new("cidr_ip", types::cidr()).with_provider_name("CidrIp"))
        .attribute(
            AttributeSchema::new("source_security_group_id", AttributeType::String)
                .with_provider_name("SourceSecurityGroupId"),
        )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use nimbus_core::resource::Value;

    use super::*;

    #[test]
    fn vpc_requires_cidr_block() {
        let schema = vpc();
        let result = schema.validate(&HashMap::new());
        assert!(result.is_err());

        let mut attrs = HashMap::new();
        attrs.insert("cidr_block".to_string(), Value::string("10.0.0.0/16"));
        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn vpc_rejects_unknown_tenancy() {
        let schema = vpc();
        let mut attrs = HashMap::new();
        attrs.insert("cidr_block".to_string(), Value::string("10.0.0.0/16"));
        attrs.insert("instance_tenancy".to_string(), Value::string("host"));
        assert!(schema.validate(&attrs).is_err());
    }

    #[test]
    fn ingress_rejects_out_of_range_port() {
        let schema = security_group_ingress();
        let mut attrs = HashMap::new();
        attrs.insert("security_group_id".to_string(), Value::string("sg-0abc"));
        attrs.insert("ip_protocol".to_string(), Value::string("tcp"));
        attrs.insert("from_port".to_string(), Value::Int(70000));
        assert!(schema.validate(&attrs).is_err());
    }

    #[test]
    fn subnet_accepts_references() {
        let schema = subnet();
        let mut attrs = HashMap::new();
        attrs.insert("vpc_id".to_string(), Value::reference("vpc", "vpc_id"));
        attrs.insert("cidr_block".to_string(), Value::string("10.0.64.0/18"));
        assert!(schema.validate(&attrs).is_ok());
    }
}
