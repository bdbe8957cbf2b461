//! User data - instance bootstrap script
//!
//! The script writes the application environment file and restarts the
//! service. Database coordinates use `${db_instance...}` placeholders so the
//! endpoint is interpolated at execution time, once the instance exists.

use crate::config::StackConfig;

pub fn render(config: &StackConfig) -> String {
    let mut env = format!("PORT={}\n", config.compute.app_port);

    if let Some(db) = &config.database {
        env.push_str("DB_HOST=${db_instance.endpoint_address}\n");
        env.push_str("DB_PORT=${db_instance.endpoint_port}\n");
        env.push_str(&format!("DB_NAME={}\n", db.db_name));
        env.push_str(&format!("DB_USER={}\n", db.username));
        env.push_str(&format!("DB_PASSWORD={}\n", db.password));
    }

    format!(
        "#!/bin/bash\n\
         set -euo pipefail\n\
         \n\
         mkdir -p /etc/webapp\n\
         cat > /etc/webapp/env <<'EOF'\n\
         {env}EOF\n\
         chmod 600 /etc/webapp/env\n\
         \n\
         /opt/aws/amazon-cloudwatch-agent/bin/amazon-cloudwatch-agent-ctl \\\n\
        \x20    -a fetch-config -m ec2 -c file:/opt/cloudwatch-config.json -s || true\n\
         \n\
         systemctl enable webapp.service\n\
         systemctl restart webapp.service\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::sample_config;

    #[test]
    fn includes_database_placeholders() {
        let script = render(&sample_config());
        assert!(script.starts_with("#!/bin/bash"));
        assert!(script.contains("DB_HOST=${db_instance.endpoint_address}"));
        assert!(script.contains("DB_PORT=${db_instance.endpoint_port}"));
        assert!(script.contains("DB_NAME=webapp"));
        assert!(script.contains("PORT=8080"));
    }

    #[test]
    fn omits_database_without_one() {
        let mut config = sample_config();
        config.database = None;
        let script = render(&config);
        assert!(!script.contains("DB_HOST"));
        assert!(!script.contains("${"));
        assert!(script.contains("PORT=8080"));
    }

    #[test]
    fn restarts_the_service() {
        let script = render(&sample_config());
        assert!(script.contains("systemctl restart webapp.service"));
    }
}
