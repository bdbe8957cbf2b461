//! Compute tier - IAM, launch template, auto-scaling group, scaling
//! policies and the CPU alarms that drive them

use std::collections::HashMap;

use crate::config::StackConfig;
use crate::resource::{Resource, Value};

use super::{binding, tags, userdata};

const CLOUDWATCH_AGENT_POLICY: &str = "arn:aws:iam::aws:policy/CloudWatchAgentServerPolicy";

pub fn build(config: &StackConfig, subnet_count: usize) -> Vec<Resource> {
    let stack = &config.stack_name;
    let mut out = Vec::new();

    let role_name = format!("{}-ec2-role", stack);
    out.push(
        Resource::new("iam_role", &role_name)
            .with_binding(binding::APP_ROLE)
            .with_attribute("role_name", Value::string(&role_name))
            .with_attribute("assume_role_policy_document", ec2_assume_role_policy())
            .with_attribute(
                "managed_policy_arns",
                Value::List(vec![Value::string(CLOUDWATCH_AGENT_POLICY)]),
            )
            .with_attribute("tags", tags(config, &role_name)),
    );

    let profile_name = format!("{}-instance-profile", stack);
    out.push(
        Resource::new("instance_profile", &profile_name)
            .with_binding(binding::INSTANCE_PROFILE)
            .with_attribute("instance_profile_name", Value::string(&profile_name))
            .with_attribute(
                "roles",
                Value::List(vec![Value::reference(binding::APP_ROLE, "role_name")]),
            ),
    );

    let template_name = format!("{}-launch-template", stack);
    out.push(
        Resource::new("launch_template", &template_name)
            .with_binding(binding::LAUNCH_TEMPLATE)
            .with_attribute("launch_template_name", Value::string(&template_name))
            .with_attribute("launch_template_data", launch_template_data(config)),
    );

    let asg_name = format!("{}-asg", stack);
    let mut launch_template_ref = HashMap::new();
    launch_template_ref.insert(
        "launch_template_id".to_string(),
        Value::reference(binding::LAUNCH_TEMPLATE, "launch_template_id"),
    );
    launch_template_ref.insert(
        "version".to_string(),
        Value::reference(binding::LAUNCH_TEMPLATE, "latest_version_number"),
    );

    let mut asg_name_tag = HashMap::new();
    asg_name_tag.insert("key".to_string(), Value::string("Name"));
    asg_name_tag.insert("value".to_string(), Value::string(format!("{}-app", stack)));
    asg_name_tag.insert("propagate_at_launch".to_string(), Value::Bool(true));

    out.push(
        Resource::new("autoscaling_group", &asg_name)
            .with_binding(binding::ASG)
            .with_attribute("auto_scaling_group_name", Value::string(&asg_name))
            // CloudFormation models group sizes as strings
            .with_attribute("min_size", Value::string(config.scaling.min_size.to_string()))
            .with_attribute("max_size", Value::string(config.scaling.max_size.to_string()))
            .with_attribute(
                "desired_capacity",
                Value::string(config.scaling.desired_capacity.to_string()),
            )
            .with_attribute("launch_template", Value::Map(launch_template_ref))
            .with_attribute(
                "vpc_zone_identifier",
                Value::List(
                    (0..subnet_count)
                        .map(|i| Value::reference(binding::public_subnet(i), "subnet_id"))
                        .collect(),
                ),
            )
            .with_attribute(
                "target_group_arns",
                Value::List(vec![Value::reference(
                    binding::TARGET_GROUP,
                    "target_group_arn",
                )]),
            )
            .with_attribute("health_check_type", Value::string("ELB"))
            .with_attribute("health_check_grace_period", Value::Int(300))
            .with_attribute("tags", Value::List(vec![Value::Map(asg_name_tag)])),
    );

    out.push(scaling_policy(stack, "scale-up", binding::SCALE_UP, 1));
    out.push(scaling_policy(stack, "scale-down", binding::SCALE_DOWN, -1));

    out.push(cpu_alarm(
        stack,
        "cpu-high",
        binding::CPU_HIGH_ALARM,
        "GreaterThanThreshold",
        config.scaling.cpu_high_threshold,
        binding::SCALE_UP,
        "Scale up when average CPU runs hot",
    ));
    out.push(cpu_alarm(
        stack,
        "cpu-low",
        binding::CPU_LOW_ALARM,
        "LessThanThreshold",
        config.scaling.cpu_low_threshold,
        binding::SCALE_DOWN,
        "Scale down when average CPU idles",
    ));

    out
}

fn ec2_assume_role_policy() -> Value {
    let mut principal = HashMap::new();
    principal.insert("service".to_string(), Value::string("ec2.amazonaws.com"));

    let mut statement = HashMap::new();
    statement.insert("effect".to_string(), Value::string("Allow"));
    statement.insert("principal".to_string(), Value::Map(principal));
    statement.insert("action".to_string(), Value::string("sts:AssumeRole"));

    let mut doc = HashMap::new();
    doc.insert("version".to_string(), Value::string("2012-10-17"));
    doc.insert("statement".to_string(), Value::List(vec![Value::Map(statement)]));
    Value::Map(doc)
}

fn launch_template_data(config: &StackConfig) -> Value {
    let mut profile = HashMap::new();
    profile.insert(
        "name".to_string(),
        Value::reference(binding::INSTANCE_PROFILE, "instance_profile_name"),
    );

    let mut ebs = HashMap::new();
    ebs.insert(
        "volume_size".to_string(),
        Value::Int(config.compute.root_volume_size_gb),
    );
    ebs.insert(
        "volume_type".to_string(),
        Value::string(&config.compute.root_volume_type),
    );
    ebs.insert("delete_on_termination".to_string(), Value::Bool(true));

    let mut root_device = HashMap::new();
    root_device.insert("device_name".to_string(), Value::string("/dev/xvda"));
    root_device.insert("ebs".to_string(), Value::Map(ebs));

    let mut data = HashMap::new();
    data.insert("image_id".to_string(), Value::string(&config.compute.ami_id));
    data.insert(
        "instance_type".to_string(),
        Value::string(&config.compute.instance_type),
    );
    data.insert("key_name".to_string(), Value::string(&config.compute.key_name));
    data.insert("iam_instance_profile".to_string(), Value::Map(profile));
    data.insert(
        "security_group_ids".to_string(),
        Value::List(vec![Value::reference(binding::APP_SG, "group_id")]),
    );
    data.insert(
        "block_device_mappings".to_string(),
        Value::List(vec![Value::Map(root_device)]),
    );
    data.insert(
        "user_data".to_string(),
        Value::Template(userdata::render(config)),
    );
    Value::Map(data)
}

fn scaling_policy(stack: &str, suffix: &str, policy_binding: &str, adjustment: i64) -> Resource {
    Resource::new("scaling_policy", format!("{}-{}", stack, suffix))
        .with_binding(policy_binding)
        .with_attribute(
            "auto_scaling_group_name",
            Value::reference(binding::ASG, "auto_scaling_group_name"),
        )
        .with_attribute("policy_type", Value::string("SimpleScaling"))
        .with_attribute("adjustment_type", Value::string("ChangeInCapacity"))
        .with_attribute("scaling_adjustment", Value::Int(adjustment))
        // CloudFormation models the cooldown as a string
        .with_attribute("cooldown", Value::string("60"))
}

fn cpu_alarm(
    stack: &str,
    suffix: &str,
    alarm_binding: &str,
    comparison: &str,
    threshold: f64,
    policy_binding: &str,
    description: &str,
) -> Resource {
    let mut dimension = HashMap::new();
    dimension.insert("name".to_string(), Value::string("AutoScalingGroupName"));
    dimension.insert(
        "value".to_string(),
        Value::reference(binding::ASG, "auto_scaling_group_name"),
    );

    let name = format!("{}-{}", stack, suffix);
    Resource::new("cloudwatch_alarm", &name)
        .with_binding(alarm_binding)
        .with_attribute("alarm_name", Value::string(&name))
        .with_attribute("alarm_description", Value::string(description))
        .with_attribute("namespace", Value::string("AWS/EC2"))
        .with_attribute("metric_name", Value::string("CPUUtilization"))
        .with_attribute("statistic", Value::string("Average"))
        .with_attribute("period", Value::Int(60))
        .with_attribute("evaluation_periods", Value::Int(2))
        .with_attribute("threshold", Value::Float(threshold))
        .with_attribute("comparison_operator", Value::string(comparison))
        .with_attribute(
            "alarm_actions",
            Value::List(vec![Value::reference(policy_binding, "arn")]),
        )
        .with_attribute("dimensions", Value::List(vec![Value::Map(dimension)]))
}
