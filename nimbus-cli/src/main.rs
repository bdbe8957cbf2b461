use std::collections::HashMap;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use similar::{ChangeTag, TextDiff};

use nimbus_core::bindings::BindingMap;
use nimbus_core::config::StackConfig;
use nimbus_core::differ::create_plan;
use nimbus_core::effect::Effect;
use nimbus_core::interpreter::{EffectOutcome, Interpreter};
use nimbus_core::plan::Plan;
use nimbus_core::provider::Provider;
use nimbus_core::resource::{Resource, ResourceId, State, Value};
use nimbus_core::stack::{self, binding};
use nimbus_provider_aws::AwsProvider;
use nimbus_provider_aws::data;
use nimbus_provider_aws::schemas;
use nimbus_state::{ResourceRecord, StateBackend, StateFile, create_backend};

#[derive(Parser)]
#[command(name = "nimbus")]
#[command(about = "Provision the nimbus web stack on AWS", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and the topology built from it
    Validate {
        /// Path to the stack configuration
        #[arg(default_value = "nimbus.yaml")]
        config: PathBuf,
    },
    /// Show the execution plan without applying changes
    Preview {
        /// Path to the stack configuration
        #[arg(default_value = "nimbus.yaml")]
        config: PathBuf,
    },
    /// Provision the stack
    Up {
        /// Path to the stack configuration
        #[arg(default_value = "nimbus.yaml")]
        config: PathBuf,

        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,
    },
    /// Destroy every provisioned resource
    Destroy {
        /// Path to the stack configuration
        #[arg(default_value = "nimbus.yaml")]
        config: PathBuf,

        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { config } => run_validate(&config),
        Commands::Preview { config } => run_preview(&config).await,
        Commands::Up {
            config,
            auto_approve,
        } => run_up(&config, auto_approve).await,
        Commands::Destroy {
            config,
            auto_approve,
        } => run_destroy(&config, auto_approve).await,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "nimbus", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_config(path: &PathBuf) -> Result<StackConfig, String> {
    StackConfig::from_file(path).map_err(|e| e.to_string())
}

fn validate_resources(resources: &[Resource]) -> Result<(), String> {
    let mut all_schemas = HashMap::new();
    for schema in schemas::all_schemas() {
        all_schemas.insert(schema.resource_type.clone(), schema);
    }

    let mut all_errors = Vec::new();
    for resource in resources {
        if let Some(schema) = all_schemas.get(&resource.id.resource_type)
            && let Err(errors) = schema.validate(&resource.attributes)
        {
            for error in errors {
                all_errors.push(format!(
                    "{}.{}: {}",
                    resource.id.resource_type, resource.id.name, error
                ));
            }
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors.join("\n"))
    }
}

/// Synthetic zone names for offline validation; only placement varies on them
fn placeholder_zones(config: &StackConfig) -> Vec<String> {
    (0..config.network.subnets_per_tier)
        .map(|i| format!("{}{}", config.region, (b'a' + (i % 26) as u8) as char))
        .collect()
}

fn run_validate(path: &PathBuf) -> Result<(), String> {
    let config = load_config(path)?;
    let resources = stack::build_stack(&config, &placeholder_zones(&config))
        .map_err(|e| e.to_string())?;

    println!("{}", "Validating...".cyan());

    validate_resources(&resources)?;

    println!(
        "{}",
        format!("✓ {} resources validated successfully.", resources.len())
            .green()
            .bold()
    );

    for resource in &resources {
        println!("  • {}.{}", resource.id.resource_type, resource.id.name);
    }

    Ok(())
}

/// Build the topology against the region's real availability zones
async fn build_desired(config: &StackConfig) -> Result<Vec<Resource>, String> {
    let zones = data::availability_zones(&config.region)
        .await
        .map_err(|e| e.to_string())?;
    stack::build_stack(config, &zones).map_err(|e| e.to_string())
}

/// Read the current state of every recorded resource
async fn read_current_states(
    provider: &AwsProvider,
    record: &StateFile,
    resources: &[Resource],
) -> Result<HashMap<ResourceId, State>, String> {
    let mut current_states = HashMap::new();

    for resource in resources {
        let recorded = record.find_resource(&resource.id.resource_type, &resource.id.name);
        let state = match recorded.and_then(|r| r.identifier.as_deref()) {
            Some(identifier) => provider
                .read(&resource.id, Some(identifier))
                .await
                .map_err(|e| format!("Failed to read state: {}", e))?,
            None => State::not_found(resource.id.clone()),
        };
        current_states.insert(resource.id.clone(), state);
    }

    Ok(current_states)
}

/// Seed bindings with declared attributes and everything already observed
fn build_bindings(
    resources: &[Resource],
    current_states: &HashMap<ResourceId, State>,
) -> BindingMap {
    let mut bindings = BindingMap::new();
    bindings.seed(resources);
    for resource in resources {
        if let Some(binding) = resource.binding()
            && let Some(state) = current_states.get(&resource.id)
            && state.exists
        {
            bindings.record_state(binding, state);
        }
    }
    bindings
}

/// Resolve what can be resolved and diff against the current states
fn plan_changes(
    resources: &[Resource],
    current_states: &HashMap<ResourceId, State>,
    bindings: &BindingMap,
) -> Plan {
    let resolved: Vec<Resource> = resources
        .iter()
        .map(|r| bindings.resolve_resource_lenient(r))
        .collect();
    create_plan(&resolved, current_states)
}

async fn run_preview(path: &PathBuf) -> Result<(), String> {
    let config = load_config(path)?;
    let resources = build_desired(&config).await?;
    validate_resources(&resources)?;

    let backend = create_backend(&config.backend, &config.region)
        .await
        .map_err(|e| e.to_string())?;
    let record = backend
        .read_state()
        .await
        .map_err(|e| e.to_string())?
        .unwrap_or_default();

    let provider = AwsProvider::new(&config.region).await;
    let current_states = read_current_states(&provider, &record, &resources).await?;
    let bindings = build_bindings(&resources, &current_states);
    let plan = plan_changes(&resources, &current_states, &bindings);

    if plan.is_empty() {
        println!("{}", "No changes needed.".green());
        return Ok(());
    }

    print_plan(&plan);
    Ok(())
}

async fn run_up(path: &PathBuf, auto_approve: bool) -> Result<(), String> {
    let config = load_config(path)?;
    let resources = build_desired(&config).await?;
    validate_resources(&resources)?;

    let backend = create_backend(&config.backend, &config.region)
        .await
        .map_err(|e| e.to_string())?;
    backend.init().await.map_err(|e| e.to_string())?;
    let mut record = backend
        .read_state()
        .await
        .map_err(|e| e.to_string())?
        .unwrap_or_default();

    let provider = AwsProvider::new(&config.region).await;
    let current_states = read_current_states(&provider, &record, &resources).await?;
    let mut bindings = build_bindings(&resources, &current_states);
    let plan = plan_changes(&resources, &current_states, &bindings);

    if plan.is_empty() {
        println!("{}", "No changes needed.".green());
        return Ok(());
    }

    print_plan(&plan);
    println!();

    if !auto_approve && !confirm("Do you want to apply these changes?")? {
        println!("{}", "Apply cancelled.".yellow());
        return Ok(());
    }

    let lock = backend.acquire_lock("up").await.map_err(|e| e.to_string())?;

    println!("{}", "Applying changes...".cyan().bold());
    println!();

    let interpreter = Interpreter::new(provider);
    let mut success_count = 0;
    let mut failure_count = 0;

    for effect in plan.effects() {
        let executed = interpreter.execute_effect(effect, &mut bindings).await;

        match &executed.outcome {
            Ok(EffectOutcome::Created { state }) | Ok(EffectOutcome::Updated { state }) => {
                println!("  {} {}", "✓".green(), format_effect(effect));
                success_count += 1;
                record.upsert_resource(to_record(&executed.id, executed.binding.as_deref(), state));
            }
            Ok(_) => {
                success_count += 1;
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), format_effect(effect), e);
                failure_count += 1;
                break;
            }
        }
    }

    // Persist whatever was provisioned, even on a partial failure
    record.increment_serial();
    backend
        .write_state(&record)
        .await
        .map_err(|e| e.to_string())?;
    backend
        .release_lock(&lock)
        .await
        .map_err(|e| e.to_string())?;

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Apply complete! {} changes applied.", success_count)
                .green()
                .bold()
        );
        print_outputs(&bindings);
        Ok(())
    } else {
        println!(
            "{}",
            format!(
                "Apply failed. {} succeeded, {} failed.",
                success_count, failure_count
            )
            .red()
            .bold()
        );
        Err("apply did not complete".to_string())
    }
}

async fn run_destroy(path: &PathBuf, auto_approve: bool) -> Result<(), String> {
    let config = load_config(path)?;

    let backend = create_backend(&config.backend, &config.region)
        .await
        .map_err(|e| e.to_string())?;
    let mut record = match backend.read_state().await.map_err(|e| e.to_string())? {
        Some(record) => record,
        None => {
            println!("{}", "Nothing has been provisioned.".yellow());
            return Ok(());
        }
    };

    let destroy_order = record.destroy_order();
    if destroy_order.is_empty() {
        println!("{}", "No resources to destroy.".green());
        return Ok(());
    }

    println!("{}", "Destroy Plan:".red().bold());
    println!();
    for resource in &destroy_order {
        println!(
            "  {} {}.{}",
            "-".red().bold(),
            resource.resource_type,
            resource.name
        );
    }
    println!();
    println!(
        "Plan: {} to destroy.",
        destroy_order.len().to_string().red()
    );
    println!();

    if !auto_approve {
        println!(
            "{}",
            "Do you really want to destroy all resources?".yellow().bold()
        );
        if !confirm("This action cannot be undone.")? {
            println!("{}", "Destroy cancelled.".yellow());
            return Ok(());
        }
        println!();
    }

    let lock = backend
        .acquire_lock("destroy")
        .await
        .map_err(|e| e.to_string())?;

    println!("{}", "Destroying resources...".red().bold());
    println!();

    let provider = AwsProvider::new(&config.region).await;
    let mut success_count = 0;
    let mut failure_count = 0;

    for resource in &destroy_order {
        let id = ResourceId::new(&resource.resource_type, &resource.name);
        let effect = Effect::Delete(id.clone());

        let Some(identifier) = resource.identifier.as_deref() else {
            println!(
                "  {} {} - no identifier recorded, skipping",
                "?".yellow(),
                format_effect(&effect)
            );
            record.remove_resource(&resource.resource_type, &resource.name);
            continue;
        };

        match provider.delete(&id, identifier).await {
            Ok(()) => {
                println!("  {} {}", "✓".green(), format_effect(&effect));
                success_count += 1;
                record.remove_resource(&resource.resource_type, &resource.name);
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), format_effect(&effect), e);
                failure_count += 1;
            }
        }
    }

    record.increment_serial();
    backend
        .write_state(&record)
        .await
        .map_err(|e| e.to_string())?;
    backend
        .release_lock(&lock)
        .await
        .map_err(|e| e.to_string())?;

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Destroy complete! {} resources destroyed.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        println!(
            "{}",
            format!(
                "Destroy failed. {} succeeded, {} failed.",
                success_count, failure_count
            )
            .red()
            .bold()
        );
        Err("destroy did not complete".to_string())
    }
}

/// Ask for a literal "yes" on stdin
fn confirm(message: &str) -> Result<bool, String> {
    println!("  {}", format!("{} Type 'yes' to confirm.", message).yellow());
    print!("\n  Enter a value: ");
    std::io::Write::flush(&mut std::io::stdout()).map_err(|e| e.to_string())?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| e.to_string())?;
    println!();

    Ok(input.trim() == "yes")
}

fn to_record(id: &ResourceId, binding: Option<&str>, state: &State) -> ResourceRecord {
    let mut record = ResourceRecord::new(&id.resource_type, &id.name);
    if let Some(binding) = binding {
        record = record.with_binding(binding);
    }
    if let Some(identifier) = &state.identifier {
        record = record.with_identifier(identifier);
    }
    for (key, value) in &state.attributes {
        if let Some(json) = value.to_json() {
            record = record.with_attribute(key, json);
        }
    }
    record
}

// =============================================================================
// Display
// =============================================================================

fn format_effect(effect: &Effect) -> String {
    let id = effect.resource_id();
    match effect {
        Effect::Create(_) => format!("+ {}.{}", id.resource_type, id.name),
        Effect::Update { .. } => format!("~ {}.{}", id.resource_type, id.name),
        Effect::Delete(_) => format!("- {}.{}", id.resource_type, id.name),
        Effect::Read(_) => format!("? {}.{}", id.resource_type, id.name),
    }
}

fn print_plan(plan: &Plan) {
    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    for effect in plan.effects() {
        match effect {
            Effect::Create(_) => println!("  {}", format_effect(effect).green()),
            Effect::Update { from, to, .. } => {
                println!("  {}", format_effect(effect).yellow());
                print_update_diff(from, to);
            }
            Effect::Delete(_) => println!("  {}", format_effect(effect).red()),
            Effect::Read(_) => {}
        }
    }

    println!();
    println!("{}", plan.summary());
}

/// Attribute-level diff between current state and the desired resource,
/// restricted to the attributes the topology declares
fn print_update_diff(from: &State, to: &Resource) {
    let current: HashMap<String, Value> = from
        .attributes
        .iter()
        .filter(|(k, _)| to.attributes.contains_key(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let before = render_attributes(&current);
    let after = render_attributes(&to.attributes);

    let diff = TextDiff::from_lines(before.as_str(), after.as_str());
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Delete => print!("      {}", format!("- {}", change).red()),
            ChangeTag::Insert => print!("      {}", format!("+ {}", change).green()),
            ChangeTag::Equal => {}
        }
    }
}

/// Render attributes as sorted "key = value" lines, masking secrets
fn render_attributes(attributes: &HashMap<String, Value>) -> String {
    let mut keys: Vec<_> = attributes
        .keys()
        .filter(|k| !k.starts_with('_'))
        .collect();
    keys.sort();

    let mut out = String::new();
    for key in keys {
        let rendered = if key.contains("password") {
            "(sensitive)".to_string()
        } else {
            format_value(&attributes[key])
        };
        out.push_str(&format!("{} = {}\n", key, rendered));
    }
    out
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let rendered: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Map(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            let rendered: Vec<String> = keys
                .iter()
                .map(|k| format!("{}: {}", k, format_value(&map[*k])))
                .collect();
            format!("{{{}}}", rendered.join(", "))
        }
        Value::Ref(binding, attribute) => format!("<{}.{}>", binding, attribute),
        Value::Template(_) => "<template>".to_string(),
    }
}

/// Print the interesting endpoints after a successful apply
fn print_outputs(bindings: &BindingMap) {
    let outputs = [
        ("load balancer", binding::ALB, "dns_name"),
        ("database", binding::DB_INSTANCE, "endpoint_address"),
        ("dns record", binding::DNS_RECORD, "fqdn"),
    ];

    let available: Vec<(&str, String)> = outputs
        .iter()
        .filter_map(|(label, b, attr)| {
            bindings
                .get(b, attr)
                .and_then(Value::as_str)
                .map(|v| (*label, v.to_string()))
        })
        .collect();

    if available.is_empty() {
        return;
    }

    println!();
    println!("{}", "Outputs:".cyan().bold());
    for (label, value) in available {
        println!("  {} = {}", label, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_effect_markers() {
        let create = Effect::Create(Resource::new("vpc", "demo-vpc"));
        assert_eq!(format_effect(&create), "+ vpc.demo-vpc");

        let delete = Effect::Delete(ResourceId::new("subnet", "demo-public-0"));
        assert_eq!(format_effect(&delete), "- subnet.demo-public-0");
    }

    #[test]
    fn render_attributes_masks_passwords() {
        let mut attrs = HashMap::new();
        attrs.insert("master_user_password".to_string(), Value::string("secret"));
        attrs.insert("engine".to_string(), Value::string("mysql"));
        attrs.insert("_binding".to_string(), Value::string("db_instance"));

        let rendered = render_attributes(&attrs);
        assert!(rendered.contains("master_user_password = (sensitive)"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("engine = \"mysql\""));
        assert!(!rendered.contains("_binding"));
    }

    #[test]
    fn format_value_shows_refs_symbolically() {
        assert_eq!(format_value(&Value::reference("vpc", "vpc_id")), "<vpc.vpc_id>");
        assert_eq!(
            format_value(&Value::List(vec![Value::Int(1), Value::string("a")])),
            "[1, \"a\"]"
        );
    }

    #[test]
    fn placeholder_zones_follow_region() {
        let config = sample_config();
        let zones = placeholder_zones(&config);
        assert_eq!(zones, vec!["us-east-1a", "us-east-1b", "us-east-1c"]);
    }

    fn sample_config() -> StackConfig {
        StackConfig::from_yaml(
            r#"
stack_name: demo
region: us-east-1
network:
  vpc_cidr: 10.0.0.0/16
  subnets_per_tier: 3
compute:
  ami_id: ami-0123456789abcdef0
  instance_type: t3.micro
  key_name: demo-key
  app_port: 8080
scaling:
  min_size: 1
  max_size: 3
  desired_capacity: 1
  cpu_high_threshold: 80
  cpu_low_threshold: 20
"#,
        )
        .unwrap()
    }
}
