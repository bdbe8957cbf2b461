//! Schemas for the compute tier: IAM, launch template, auto-scaling,
//! alarms and load balancing

use nimbus_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

pub(super) fn schemas() -> Vec<ResourceSchema> {
    vec![
        iam_role(),
        instance_profile(),
        launch_template(),
        autoscaling_group(),
        scaling_policy(),
        cloudwatch_alarm(),
        load_balancer(),
        target_group(),
        listener(),
    ]
}

fn string_list() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::String))
}

fn tags() -> AttributeSchema {
    AttributeSchema::new("tags", AttributeType::Map(Box::new(AttributeType::String)))
}

fn iam_role() -> ResourceSchema {
    ResourceSchema::new("iam_role")
        .attribute(
            AttributeSchema::new("role_name", AttributeType::String)
                .required()
                .with_provider_name("RoleName"),
        )
        .attribute(
            AttributeSchema::new("assume_role_policy_document", AttributeType::Any)
                .required()
                .with_description("Trust policy; nested statements are not type-checked")
                .with_provider_name("AssumeRolePolicyDocument"),
        )
        .attribute(
            AttributeSchema::new("managed_policy_arns", string_list())
                .with_provider_name("ManagedPolicyArns"),
        )
        .attribute(tags())
}

fn instance_profile() -> ResourceSchema {
    ResourceSchema::new("instance_profile")
        .attribute(
            AttributeSchema::new("instance_profile_name", AttributeType::String)
                .required()
                .with_provider_name("InstanceProfileName"),
        )
        .attribute(AttributeSchema::new("roles", string_list()).required().with_provider_name("Roles"))
}

fn launch_template() -> ResourceSchema {
    ResourceSchema::new("launch_template")
        .attribute(
            AttributeSchema::new("launch_template_name", AttributeType::String)
                .required()
                .with_provider_name("LaunchTemplateName"),
        )
        .attribute(
            AttributeSchema::new("launch_template_data", AttributeType::Any)
                .required()
                .with_description("Instance definition; nested fields are not type-checked")
                .with_provider_name("LaunchTemplateData"),
        )
}

fn autoscaling_group() -> ResourceSchema {
    ResourceSchema::new("autoscaling_group")
        .attribute(
            AttributeSchema::new("auto_scaling_group_name", AttributeType::String)
                .required()
                .with_provider_name("AutoScalingGroupName"),
        )
        .attribute(
            AttributeSchema::new("min_size", AttributeType::String)
                .required()
                .with_description("CloudFormation models group sizes as strings")
                .with_provider_name("MinSize"),
        )
        .attribute(
            AttributeSchema::new("max_size", AttributeType::String)
                .required()
                .with_provider_name("MaxSize"),
        )
        .attribute(
            AttributeSchema::new("desired_capacity", AttributeType::String)
                .with_provider_name("DesiredCapacity"),
        )
        .attribute(
            AttributeSchema::new(
                "launch_template",
                AttributeType::Map(Box::new(AttributeType::String)),
            )
            .required()
            .with_provider_name("LaunchTemplate"),
        )
        .attribute(
            AttributeSchema::new("vpc_zone_identifier", string_list())
                .required()
                .with_provider_name("VPCZoneIdentifier"),
        )
        .attribute(
            AttributeSchema::new("target_group_arns", string_list())
                .with_provider_name("TargetGroupARNs"),
        )
        .attribute(
            AttributeSchema::new(
                "health_check_type",
                AttributeType::Enum(vec!["EC2".to_string(), "ELB".to_string()]),
            )
            .with_provider_name("HealthCheckType"),
        )
        .attribute(
            AttributeSchema::new("health_check_grace_period", types::positive_int())
                .with_provider_name("HealthCheckGracePeriod"),
        )
        .attribute(
            AttributeSchema::new("tags", AttributeType::List(Box::new(AttributeType::Any)))
                .with_description("Auto-scaling tags carry propagate_at_launch")
                .with_provider_name("Tags"),
        )
}

fn scaling_policy() -> ResourceSchema {
    ResourceSchema::new("scaling_policy")
        .attribute(
            AttributeSchema::new("auto_scaling_group_name", AttributeType::String)
                .required()
                .with_provider_name("AutoScalingGroupName"),
        )
        .attribute(
            AttributeSchema::new(
                "policy_type",
                AttributeType::Enum(vec![
                    "SimpleScaling".to_string(),
                    "StepScaling".to_string(),
                    "TargetTrackingScaling".to_string(),
                ]),
            )
            .with_provider_name("PolicyType"),
        )
        .attribute(
            AttributeSchema::new("adjustment_type", AttributeType::String)
                .with_provider_name("AdjustmentType"),
        )
        .attribute(
            AttributeSchema::new("scaling_adjustment", AttributeType::Int)
                .with_provider_name("ScalingAdjustment"),
        )
        .attribute(
            AttributeSchema::new("cooldown", AttributeType::String).with_provider_name("Cooldown"),
        )
}

fn cloudwatch_alarm() -> ResourceSchema {
    ResourceSchema::new("cloudwatch_alarm")
        .attribute(
            AttributeSchema::new("alarm_name", AttributeType::String)
                .required()
                .with_provider_name("AlarmName"),
        )
        .attribute(
            AttributeSchema::new("alarm_description", AttributeType::String)
                .with_provider_name("AlarmDescription"),
        )
        .attribute(
            AttributeSchema::new("namespace", AttributeType::String)
                .required()
                .with_provider_name("Namespace"),
        )
        .attribute(
            AttributeSchema::new("metric_name", AttributeType::String)
                .required()
                .with_provider_name("MetricName"),
        )
        .attribute(
            AttributeSchema::new("statistic", AttributeType::String)
                .with_provider_name("Statistic"),
        )
        .attribute(
            AttributeSchema::new("period", types::positive_int()).with_provider_name("Period"),
        )
        .attribute(
            AttributeSchema::new("evaluation_periods", types::positive_int())
                .required()
                .with_provider_name("EvaluationPeriods"),
        )
        .attribute(
            AttributeSchema::new("threshold", AttributeType::Float)
                .with_provider_name("Threshold"),
        )
        .attribute(
            AttributeSchema::new(
                "comparison_operator",
                AttributeType::Enum(vec![
                    "GreaterThanThreshold".to_string(),
                    "GreaterThanOrEqualToThreshold".to_string(),
                    "LessThanThreshold".to_string(),
                    "LessThanOrEqualToThreshold".to_string(),
                ]),
            )
            .required()
            .with_provider_name("ComparisonOperator"),
        )
        .attribute(
            AttributeSchema::new("alarm_actions", string_list())
                .with_provider_name("AlarmActions"),
        )
        .attribute(
            AttributeSchema::new(
                "dimensions",
                AttributeType::List(Box::new(AttributeType::Map(Box::new(AttributeType::String)))),
            )
            .with_provider_name("Dimensions"),
        )
}

fn load_balancer() -> ResourceSchema {
    ResourceSchema::new("load_balancer")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_provider_name("Name"),
        )
        .attribute(
            AttributeSchema::new(
                "type",
                AttributeType::Enum(vec!["application".to_string(), "network".to_string()]),
            )
            .with_provider_name("Type"),
        )
        .attribute(
            AttributeSchema::new(
                "scheme",
                AttributeType::Enum(vec!["internet-facing".to_string(), "internal".to_string()]),
            )
            .with_provider_name("Scheme"),
        )
        .attribute(
            AttributeSchema::new("subnets", string_list())
                .required()
                .with_provider_name("Subnets"),
        )
        .attribute(
            AttributeSchema::new("security_groups", string_list())
                .with_provider_name("SecurityGroups"),
        )
        .attribute(tags())
}

fn target_group() -> ResourceSchema {
    ResourceSchema::new("target_group")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .with_provider_name("Name"),
        )
        .attribute(AttributeSchema::new("port", types::port()).required().with_provider_name("Port"))
        .attribute(
            AttributeSchema::new(
                "protocol",
                AttributeType::Enum(vec!["HTTP".to_string(), "HTTPS".to_string()]),
            )
            .with_provider_name("Protocol"),
        )
        .attribute(
            AttributeSchema::new(
                "target_type",
                AttributeType::Enum(vec!["instance".to_string(), "ip".to_string()]),
            )
            .with_provider_name("TargetType"),
        )
        .attribute(
            AttributeSchema::new("vpc_id", AttributeType::String)
                .required()
                .with_provider_name("VpcId"),
        )
        .attribute(
            AttributeSchema::new("health_check_path", AttributeType::String)
                .with_provider_name("HealthCheckPath"),
        )
        .attribute(
            AttributeSchema::new("health_check_protocol", AttributeType::String)
                .with_provider_name("HealthCheckProtocol"),
        )
        .attribute(tags())
}

fn listener() -> ResourceSchema {
    ResourceSchema::new("listener")
        .attribute(
            AttributeSchema::new("load_balancer_arn", AttributeType::String)
                .required()
                .with_provider_name("LoadBalancerArn"),
        )
        .attribute(AttributeSchema::new("port", types::port()).required().with_provider_name("Port"))
        .attribute(
            AttributeSchema::new(
                "protocol",
                AttributeType::Enum(vec!["HTTP".to_string(), "HTTPS".to_string()]),
            )
            .with_provider_name("Protocol"),
        )
        .attribute(
            AttributeSchema::new(
                "default_actions",
                AttributeType::List(Box::new(AttributeType::Map(Box::new(AttributeType::String)))),
            )
            .required()
            .with_provider_name("DefaultActions"),
        )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use nimbus_core::resource::Value;

    use super::*;

    #[test]
    fn alarm_requires_comparison_operator() {
        let schema = cloudwatch_alarm();
        let mut attrs = HashMap::new();
        attrs.insert("alarm_name".to_string(), Value::string("demo-cpu-high"));
        attrs.insert("namespace".to_string(), Value::string("AWS/EC2"));
        attrs.insert("metric_name".to_string(), Value::string("CPUUtilization"));
        attrs.insert("evaluation_periods".to_string(), Value::Int(2));
        assert!(schema.validate(&attrs).is_err());

        attrs.insert(
            "comparison_operator".to_string(),
            Value::string("GreaterThanThreshold"),
        );
        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn alarm_threshold_accepts_float() {
        let schema = cloudwatch_alarm();
        let mut attrs = HashMap::new();
        attrs.insert("alarm_name".to_string(), Value::string("demo-cpu-high"));
        attrs.insert("namespace".to_string(), Value::string("AWS/EC2"));
        attrs.insert("metric_name".to_string(), Value::string("CPUUtilization"));
        attrs.insert("evaluation_periods".to_string(), Value::Int(2));
        attrs.insert(
            "comparison_operator".to_string(),
            Value::string("GreaterThanThreshold"),
        );
        attrs.insert("threshold".to_string(), Value::Float(82.5));
        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn load_balancer_scheme_is_constrained() {
        let schema = load_balancer();
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::string("demo-alb"));
        attrs.insert(
            "subnets".to_string(),
            Value::List(vec![Value::string("subnet-0abc")]),
        );
        attrs.insert("scheme".to_string(), Value::string("public"));
        assert!(schema.validate(&attrs).is_err());

        attrs.insert("scheme".to_string(), Value::string("internet-facing"));
        assert!(schema.validate(&attrs).is_ok());
    }
}
