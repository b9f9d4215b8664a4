//! Check command - validate a config and describe its sinks

use anyhow::Result;
use fanlog_config::{Config, SinkConfig};

/// Run the check command
pub fn run(config: &Config) -> Result<()> {
    print!("{}", describe(config));
    Ok(())
}

/// One line per enabled sink, after the mode
fn describe(config: &Config) -> String {
    let mut out = format!("mode: {}\n", config.global.mode);

    let enabled = config.enabled_sinks();
    if enabled.is_empty() {
        out.push_str("no sinks enabled\n");
        return out;
    }

    for name in enabled {
        let Some(sink) = config.sinks.get(&name) else {
            continue;
        };
        let detail = match sink {
            SinkConfig::Console(console) => format!("target={:?}", console.target),
            SinkConfig::File(file) => format!(
                "path={} rotate={:?} sweep={:?}",
                file.path, file.rotate_policy, file.sweep_policy
            ),
            SinkConfig::Syslog(syslog) if syslog.address.is_empty() => "address=local".to_string(),
            SinkConfig::Syslog(syslog) => format!("address={}", syslog.address),
        };
        out.push_str(&format!(
            "{name}: {} level={} {detail}\n",
            sink.type_name(),
            sink.level().as_str()
        ));
    }
    out
}
