//! Resource type configurations for AWS Cloud Control API
//!
//! Maps nimbus resource types to CloudFormation type names and attribute
//! names to CloudFormation property names. The tables carry the irregular
//! names mechanical case conversion cannot produce (`VPCZoneIdentifier`,
//! `TargetGroupARNs`, `DNSName`, ...). DNS records are not listed here;
//! Route53 record sets are not Cloud Control types and are managed through
//! the Route53 API directly.

/// Attribute mapping: (nimbus name, CloudFormation property name)
pub type AttrMapping = (&'static str, &'static str);

/// Resource type configuration
pub struct ResourceConfig {
    /// AWS CloudFormation type name (e.g., "AWS::EC2::VPC")
    pub aws_type_name: &'static str,
    /// Attribute mappings (nimbus name -> CloudFormation name)
    pub attributes: &'static [AttrMapping],
    /// Whether this resource type uses [{Key, Value}] tags
    pub has_tags: bool,
}

// =============================================================================
// Network Resources
// =============================================================================

pub const VPC_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::EC2::VPC",
    attributes: &[
        ("vpc_id", "VpcId"), // Read-only identifier
        ("cidr_block", "CidrBlock"),
        ("instance_tenancy", "InstanceTenancy"),
        ("enable_dns_support", "EnableDnsSupport"),
        ("enable_dns_hostnames", "EnableDnsHostnames"),
    ],
    has_tags: true,
};

pub const SUBNET_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::EC2::Subnet",
    attributes: &[
        ("subnet_id", "SubnetId"), // Read-only identifier
        ("vpc_id", "VpcId"),
        ("cidr_block", "CidrBlock"),
        ("availability_zone", "AvailabilityZone"),
        ("map_public_ip_on_launch", "MapPublicIpOnLaunch"),
    ],
    has_tags: true,
};

pub const INTERNET_GATEWAY_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::EC2::InternetGateway",
    attributes: &[
        ("internet_gateway_id", "InternetGatewayId"), // Read-only identifier
    ],
    has_tags: true,
};

pub const VPC_GATEWAY_ATTACHMENT_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::EC2::VPCGatewayAttachment",
    attributes: &[
        ("vpc_id", "VpcId"),
        ("internet_gateway_id", "InternetGatewayId"),
    ],
    has_tags: false,
};

pub const ROUTE_TABLE_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::EC2::RouteTable",
    attributes: &[
        ("route_table_id", "RouteTableId"), // Read-only identifier
        ("vpc_id", "VpcId"),
    ],
    has_tags: true,
};

pub const ROUTE_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::EC2::Route",
    attributes: &[
        ("route_table_id", "RouteTableId"),
        ("destination_cidr_block", "DestinationCidrBlock"),
        ("gateway_id", "GatewayId"),
    ],
    has_tags: false,
};

pub const ROUTE_TABLE_ASSOCIATION_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::EC2::SubnetRouteTableAssociation",
    attributes: &[
        ("id", "Id"), // Read-only identifier
        ("subnet_id", "SubnetId"),
        ("route_table_id", "RouteTableId"),
    ],
    has_tags: false,
};

// =============================================================================
// Security Group Resources
// =============================================================================

pub const SECURITY_GROUP_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::EC2::SecurityGroup",
    attributes: &[
        ("group_id", "GroupId"), // Read-only identifier
        ("group_name", "GroupName"),
        ("description", "GroupDescription"),
        ("vpc_id", "VpcId"),
    ],
    has_tags: true,
};

pub const SECURITY_GROUP_INGRESS_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::EC2::SecurityGroupIngress",
    attributes: &[
        ("security_group_id", "GroupId"),
        ("ip_protocol", "IpProtocol"),
        ("from_port", "FromPort"),
        ("to_port", "ToPort"),
        ("cidr_ip", "CidrIp"),
        ("source_security_group_id", "SourceSecurityGroupId"),
    ],
    has_tags: false,
};

// =============================================================================
// Compute Resources
// =============================================================================

pub const LAUNCH_TEMPLATE_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::EC2::LaunchTemplate",
    attributes: &[
        ("launch_template_id", "LaunchTemplateId"), // Read-only identifier
        ("latest_version_number", "LatestVersionNumber"), // Read-only
        ("launch_template_name", "LaunchTemplateName"),
        ("launch_template_data", "LaunchTemplateData"),
    ],
    has_tags: false,
};

pub const AUTOSCALING_GROUP_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::AutoScaling::AutoScalingGroup",
    attributes: &[
        ("auto_scaling_group_name", "AutoScalingGroupName"),
        ("min_size", "MinSize"),
        ("max_size", "MaxSize"),
        ("desired_capacity", "DesiredCapacity"),
        ("launch_template", "LaunchTemplate"),
        ("vpc_zone_identifier", "VPCZoneIdentifier"),
        ("target_group_arns", "TargetGroupARNs"),
        ("health_check_type", "HealthCheckType"),
        ("health_check_grace_period", "HealthCheckGracePeriod"),
        // Auto-scaling tags carry PropagateAtLaunch, so they are passed as a
        // plain attribute rather than through the shared tag handling
        ("tags", "Tags"),
    ],
    has_tags: false,
};

pub const SCALING_POLICY_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::AutoScaling::ScalingPolicy",
    attributes: &[
        ("arn", "Arn"), // Read-only identifier
        ("auto_scaling_group_name", "AutoScalingGroupName"),
        ("policy_type", "PolicyType"),
        ("adjustment_type", "AdjustmentType"),
        ("scaling_adjustment", "ScalingAdjustment"),
        ("cooldown", "Cooldown"),
    ],
    has_tags: false,
};

pub const CLOUDWATCH_ALARM_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::CloudWatch::Alarm",
    attributes: &[
        ("arn", "Arn"), // Read-only
        ("alarm_name", "AlarmName"),
        ("alarm_description", "AlarmDescription"),
        ("namespace", "Namespace"),
        ("metric_name", "MetricName"),
        ("statistic", "Statistic"),
        ("period", "Period"),
        ("evaluation_periods", "EvaluationPeriods"),
        ("threshold", "Threshold"),
        ("comparison_operator", "ComparisonOperator"),
        ("alarm_actions", "AlarmActions"),
        ("dimensions", "Dimensions"),
    ],
    has_tags: false,
};

// =============================================================================
// Load Balancing Resources
// =============================================================================

pub const LOAD_BALANCER_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::ElasticLoadBalancingV2::LoadBalancer",
    attributes: &[
        ("load_balancer_arn", "LoadBalancerArn"), // Read-only identifier
        ("dns_name", "DNSName"),                  // Read-only
        ("canonical_hosted_zone_id", "CanonicalHostedZoneID"), // Read-only
        ("name", "Name"),
        ("type", "Type"),
        ("scheme", "Scheme"),
        ("subnets", "Subnets"),
        ("security_groups", "SecurityGroups"),
    ],
    has_tags: true,
};

pub const TARGET_GROUP_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::ElasticLoadBalancingV2::TargetGroup",
    attributes: &[
        ("target_group_arn", "TargetGroupArn"), // Read-only identifier
        ("name", "Name"),
        ("port", "Port"),
        ("protocol", "Protocol"),
        ("target_type", "TargetType"),
        ("vpc_id", "VpcId"),
        ("health_check_path", "HealthCheckPath"),
        ("health_check_protocol", "HealthCheckProtocol"),
    ],
    has_tags: true,
};

pub const LISTENER_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::ElasticLoadBalancingV2::Listener",
    attributes: &[
        ("listener_arn", "ListenerArn"), // Read-only identifier
        ("load_balancer_arn", "LoadBalancerArn"),
        ("port", "Port"),
        ("protocol", "Protocol"),
        ("default_actions", "DefaultActions"),
    ],
    has_tags: false,
};

// =============================================================================
// Database Resources
// =============================================================================

pub const DB_SUBNET_GROUP_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::RDS::DBSubnetGroup",
    attributes: &[
        ("db_subnet_group_name", "DBSubnetGroupName"),
        ("description", "DBSubnetGroupDescription"),
        ("subnet_ids", "SubnetIds"),
    ],
    has_tags: true,
};

pub const DB_PARAMETER_GROUP_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::RDS::DBParameterGroup",
    attributes: &[
        ("db_parameter_group_name", "DBParameterGroupName"),
        ("family", "Family"),
        ("description", "Description"),
    ],
    has_tags: true,
};

pub const DB_INSTANCE_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::RDS::DBInstance",
    attributes: &[
        ("db_instance_identifier", "DBInstanceIdentifier"),
        ("engine", "Engine"),
        ("engine_version", "EngineVersion"),
        ("db_instance_class", "DBInstanceClass"),
        ("allocated_storage", "AllocatedStorage"),
        ("db_name", "DBName"),
        ("master_username", "MasterUsername"),
        ("master_user_password", "MasterUserPassword"),
        ("publicly_accessible", "PubliclyAccessible"),
        ("multi_az", "MultiAZ"),
        ("vpc_security_groups", "VPCSecurityGroups"),
        ("db_subnet_group_name", "DBSubnetGroupName"),
        ("db_parameter_group_name", "DBParameterGroupName"),
    ],
    has_tags: true,
};

// =============================================================================
// IAM Resources
// =============================================================================

pub const IAM_ROLE_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::IAM::Role",
    attributes: &[
        ("arn", "Arn"), // Read-only
        ("role_name", "RoleName"),
        ("assume_role_policy_document", "AssumeRolePolicyDocument"),
        ("managed_policy_arns", "ManagedPolicyArns"),
    ],
    has_tags: true,
};

pub const INSTANCE_PROFILE_CONFIG: ResourceConfig = ResourceConfig {
    aws_type_name: "AWS::IAM::InstanceProfile",
    attributes: &[
        ("arn", "Arn"), // Read-only
        ("instance_profile_name", "InstanceProfileName"),
        ("roles", "Roles"),
    ],
    has_tags: false,
};

// =============================================================================
// Config Lookup
// =============================================================================

/// Get resource configuration by nimbus type name
pub fn get_resource_config(resource_type: &str) -> Option<&'static ResourceConfig> {
    match resource_type {
        "vpc" => Some(&VPC_CONFIG),
        "subnet" => Some(&SUBNET_CONFIG),
        "internet_gateway" => Some(&INTERNET_GATEWAY_CONFIG),
        "vpc_gateway_attachment" => Some(&VPC_GATEWAY_ATTACHMENT_CONFIG),
        "route_table" => Some(&ROUTE_TABLE_CONFIG),
        "route" => Some(&ROUTE_CONFIG),
        "route_table_association" => Some(&ROUTE_TABLE_ASSOCIATION_CONFIG),
        "security_group" => Some(&SECURITY_GROUP_CONFIG),
        "security_group_ingress" => Some(&SECURITY_GROUP_INGRESS_CONFIG),
        "launch_template" => Some(&LAUNCH_TEMPLATE_CONFIG),
        "autoscaling_group" => Some(&AUTOSCALING_GROUP_CONFIG),
        "scaling_policy" => Some(&SCALING_POLICY_CONFIG),
        "cloudwatch_alarm" => Some(&CLOUDWATCH_ALARM_CONFIG),
        "load_balancer" => Some(&LOAD_BALANCER_CONFIG),
        "target_group" => Some(&TARGET_GROUP_CONFIG),
        "listener" => Some(&LISTENER_CONFIG),
        "db_subnet_group" => Some(&DB_SUBNET_GROUP_CONFIG),
        "db_parameter_group" => Some(&DB_PARAMETER_GROUP_CONFIG),
        "db_instance" => Some(&DB_INSTANCE_CONFIG),
        "iam_role" => Some(&IAM_ROLE_CONFIG),
        "instance_profile" => Some(&INSTANCE_PROFILE_CONFIG),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_type_name() {
        assert!(get_resource_config("vpc").is_some());
        assert!(get_resource_config("autoscaling_group").is_some());
        assert!(get_resource_config("dns_record").is_none());
        assert!(get_resource_config("unknown").is_none());
    }

    #[test]
    fn aws_type_names() {
        assert_eq!(get_resource_config("vpc").unwrap().aws_type_name, "AWS::EC2::VPC");
        assert_eq!(
            get_resource_config("db_instance").unwrap().aws_type_name,
            "AWS::RDS::DBInstance"
        );
        assert_eq!(
            get_resource_config("load_balancer").unwrap().aws_type_name,
            "AWS::ElasticLoadBalancingV2::LoadBalancer"
        );
    }

    #[test]
    fn irregular_property_names_are_mapped() {
        let asg = get_resource_config("autoscaling_group").unwrap();
        assert!(asg.attributes.contains(&("vpc_zone_identifier", "VPCZoneIdentifier")));
        assert!(asg.attributes.contains(&("target_group_arns", "TargetGroupARNs")));

        let alb = get_resource_config("load_balancer").unwrap();
        assert!(alb.attributes.contains(&("dns_name", "DNSName")));
    }
}
