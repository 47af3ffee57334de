//! Static zellij layout for people who would rather run their services
//! inside zellij than inside devmux.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use devmux_core::model::ServiceDescriptor;

pub const ZELLIJ_DIR: &str = ".zellij";

#[derive(Debug, Error)]
#[error("failed to write {}: {source}", path.display())]
pub struct ZellijError {
    path: PathBuf,
    #[source]
    source: io::Error,
}

#[derive(Debug)]
pub struct ZellijFiles {
    pub layout: PathBuf,
    pub config: PathBuf,
}

fn kdl_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// One tab per service, each running its command through `sh -c`, under a
/// borderless one-row tab bar.
pub fn layout_kdl(services: &[ServiceDescriptor]) -> String {
    let mut out = String::from(
        "layout {\n    default_tab_template {\n        pane size=1 borderless=true {\n            plugin location=\"zellij:tab-bar\"\n        }\n        children\n    }\n",
    );
    for service in services {
        let _ = writeln!(out, "    tab name={} {{", kdl_string(&service.name));
        let _ = writeln!(
            out,
            "        pane borderless=true command=\"sh\" cwd={} {{",
            kdl_string(&service.working_dir.to_string_lossy())
        );
        let _ = writeln!(out, "            args \"-c\" {}", kdl_string(&service.command));
        out.push_str("        }\n    }\n");
    }
    out.push_str("}\n");
    out
}

pub fn config_kdl() -> &'static str {
    concat!(
        "keybinds {\n",
        "    normal {\n",
        "        bind \"Ctrl ,\" { GoToPreviousTab; }\n",
        "        bind \"Ctrl .\" { GoToNextTab; }\n",
        "        bind \"Ctrl t\" { NewTab; }\n",
        "        bind \"Ctrl q\" { Quit; }\n",
        "    }\n",
        "}\n",
    )
}

fn write(path: PathBuf, content: &str) -> Result<PathBuf, ZellijError> {
    match std::fs::write(&path, content) {
        Ok(()) => Ok(path),
        Err(source) => Err(ZellijError { path, source }),
    }
}

/// Writes `.zellij/layout.kdl` and `.zellij/config.kdl` under `root`.
pub fn generate(root: &Path, services: &[ServiceDescriptor]) -> Result<ZellijFiles, ZellijError> {
    let dir = root.join(ZELLIJ_DIR);
    std::fs::create_dir_all(&dir).map_err(|source| ZellijError {
        path: dir.clone(),
        source,
    })?;

    let layout = write(dir.join("layout.kdl"), &layout_kdl(services))?;
    let config = write(dir.join("config.kdl"), config_kdl())?;
    tracing::info!(layout = %layout.display(), config = %config.display(), "generated zellij files");
    Ok(ZellijFiles { layout, config })
}
