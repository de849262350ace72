use std::process::Command;

use crate::config::{WorkAppConfig, WorkAppTarget};
use crate::reaction::domain::app_switcher::AppSwitcher;

/// Brings the configured work application forward by spawning its
/// per-OS launch command through the platform shell.
///
/// The command is resolved once at construction from the active
/// target. On macOS the app is additionally activated via
/// `osascript`, since launching an already-running app does not raise
/// its window; the app name is parsed from an `open -a "Name"` command
/// or taken from the target's window keywords.
pub struct CommandAppSwitcher {
    command: String,
    activate_names: Vec<String>,
}

impl CommandAppSwitcher {
    /// Resolves the active target's command for the current OS.
    /// Returns None (with a log line) when switching is unconfigured
    /// or the target has no command for this platform.
    pub fn from_config(config: &WorkAppConfig) -> Option<Self> {
        let active = config.active.as_ref()?;
        let target = config.targets.get(active)?;

        let Some(command) = platform_command(target) else {
            log::warn!("work app target {active:?} has no command for this OS, switching disabled");
            return None;
        };

        let mut activate_names = Vec::new();
        if let Some(app) = parse_open_app_name(&command) {
            activate_names.push(app);
        }
        activate_names.extend(target.window_keywords.iter().cloned());

        Some(Self {
            command,
            activate_names,
        })
    }
}

fn platform_command(target: &WorkAppTarget) -> Option<String> {
    if cfg!(target_os = "windows") {
        target.windows_command.clone()
    } else if cfg!(target_os = "macos") {
        target.macos_command.clone()
    } else {
        target.linux_command.clone()
    }
}

/// Extracts the app name from an `open -a "App Name"` command.
fn parse_open_app_name(command: &str) -> Option<String> {
    let rest = command.strip_prefix("open -a ")?.trim();
    let name = rest
        .strip_prefix('"')
        .and_then(|r| r.split('"').next())
        .unwrap_or_else(|| rest.split_whitespace().next().unwrap_or(rest));
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn shell_spawn(command: &str) -> std::io::Result<()> {
    let mut cmd = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", command]);
        c
    } else {
        let mut c = Command::new("sh");
        c.args(["-c", command]);
        c
    };
    let mut child = cmd.spawn()?;
    // Reap the child off-thread: the reaction must not wait on the
    // launched app, and an unreaped child lingers as a zombie.
    std::thread::spawn(move || {
        let _ = child.wait();
    });
    Ok(())
}

#[cfg(target_os = "macos")]
fn activate(names: &[String]) {
    for name in names {
        let script = format!("tell application \"{name}\" to activate");
        match Command::new("osascript").args(["-e", &script]).status() {
            Ok(status) if status.success() => return,
            Ok(_) => continue,
            Err(e) => {
                log::debug!("osascript activation failed: {e}");
                return;
            }
        }
    }
}

#[cfg(not(target_os = "macos"))]
fn activate(_names: &[String]) {}

impl AppSwitcher for CommandAppSwitcher {
    fn bring_to_front(&self) -> Result<(), Box<dyn std::error::Error>> {
        shell_spawn(&self.command)
            .map_err(|e| format!("failed to launch {:?}: {e}", self.command))?;
        activate(&self.activate_names);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn config_with(target: WorkAppTarget) -> WorkAppConfig {
        WorkAppConfig {
            active: Some("work".into()),
            targets: BTreeMap::from([("work".into(), target)]),
        }
    }

    fn all_platform_target(command: &str) -> WorkAppTarget {
        WorkAppTarget {
            windows_command: Some(command.into()),
            macos_command: Some(command.into()),
            linux_command: Some(command.into()),
            window_keywords: vec!["visual studio code".into()],
        }
    }

    #[test]
    fn test_no_active_target_disables_switching() {
        let config = WorkAppConfig::default();
        assert!(CommandAppSwitcher::from_config(&config).is_none());
    }

    #[test]
    fn test_target_without_platform_command_disables_switching() {
        let config = config_with(WorkAppTarget::default());
        assert!(CommandAppSwitcher::from_config(&config).is_none());
    }

    #[test]
    fn test_resolves_command_and_keywords() {
        let config = config_with(all_platform_target("code"));
        let switcher = CommandAppSwitcher::from_config(&config).unwrap();
        assert_eq!(switcher.command, "code");
        assert!(switcher
            .activate_names
            .contains(&"visual studio code".to_string()));
    }

    #[test]
    fn test_parse_open_app_name_quoted() {
        assert_eq!(
            parse_open_app_name(r#"open -a "Visual Studio Code""#),
            Some("Visual Studio Code".to_string())
        );
    }

    #[test]
    fn test_parse_open_app_name_bare() {
        assert_eq!(
            parse_open_app_name("open -a Safari"),
            Some("Safari".to_string())
        );
    }

    #[test]
    fn test_parse_open_app_name_rejects_other_commands() {
        assert_eq!(parse_open_app_name("code ."), None);
    }

    #[test]
    fn test_bring_to_front_spawns_without_waiting() {
        let config = config_with(all_platform_target("true"));
        let switcher = CommandAppSwitcher::from_config(&config).unwrap();
        switcher.bring_to_front().unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn test_bring_to_front_returns_before_command_exits() {
        let config = config_with(WorkAppTarget {
            linux_command: Some("sleep 5".into()),
            macos_command: Some("sleep 5".into()),
            ..WorkAppTarget::default()
        });
        let switcher = CommandAppSwitcher::from_config(&config).unwrap();

        let started = std::time::Instant::now();
        switcher.bring_to_front().unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }
}
