//! Load balancing tier - ALB, target group and listener

use std::collections::HashMap;

use crate::config::StackConfig;
use crate::resource::{Resource, Value};

use super::{binding, tags};

pub fn build(config: &StackConfig, subnet_count: usize) -> Vec<Resource> {
    let stack = &config.stack_name;
    let mut out = Vec::new();

    let public_subnet_ids = Value::List(
        (0..subnet_count)
            .map(|i| Value::reference(binding::public_subnet(i), "subnet_id"))
            .collect(),
    );

    let alb_name = format!("{}-alb", stack);
    out.push(
        Resource::new("load_balancer", &alb_name)
            .with_binding(binding::ALB)
            .with_attribute("name", Value::string(&alb_name))
            .with_attribute("type", Value::string("application"))
            .with_attribute("scheme", Value::string("internet-facing"))
            .with_attribute("subnets", public_subnet_ids)
            .with_attribute(
                "security_groups",
                Value::List(vec![Value::reference(binding::LB_SG, "group_id")]),
            )
            .with_attribute("tags", tags(config, &alb_name)),
    );

    let tg_name = format!("{}-tg", stack);
    out.push(
        Resource::new("target_group", &tg_name)
            .with_binding(binding::TARGET_GROUP)
            .with_attribute("name", Value::string(&tg_name))
            .with_attribute("port", Value::Int(i64::from(config.compute.app_port)))
            .with_attribute("protocol", Value::string("HTTP"))
            .with_attribute("target_type", Value::string("instance"))
            .with_attribute("vpc_id", Value::reference(binding::VPC, "vpc_id"))
            .with_attribute(
                "health_check_path",
                Value::string(&config.scaling.health_check_path),
            )
            .with_attribute("health_check_protocol", Value::string("HTTP"))
            .with_attribute("tags", tags(config, &tg_name)),
    );

    let forward = {
        let mut action = HashMap::new();
        action.insert("type".to_string(), Value::string("forward"));
        action.insert(
            "target_group_arn".to_string(),
            Value::reference(binding::TARGET_GROUP, "target_group_arn"),
        );
        Value::List(vec![Value::Map(action)])
    };

    out.push(
        Resource::new("listener", format!("{}-http-listener", stack))
            .with_binding(binding::LISTENER)
            .with_attribute(
                "load_balancer_arn",
                Value::reference(binding::ALB, "load_balancer_arn"),
            )
            .with_attribute("port", Value::Int(80))
            .with_attribute("protocol", Value::string("HTTP"))
            .with_attribute("default_actions", forward),
    );

    out
}
