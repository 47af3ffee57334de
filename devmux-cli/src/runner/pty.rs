use std::io::{Read, Write};

use portable_pty::{Child, ChildKiller, CommandBuilder, MasterPty, PtySize};

use devmux_core::model::ServiceDescriptor;
use devmux_core::state::PaneSize;

use crate::error::SpawnError;

const CHILD_ENV: [(&str, &str); 4] = [
    ("FORCE_COLOR", "1"),
    ("CLICOLOR_FORCE", "1"),
    ("TERM", "xterm-256color"),
    ("COLORTERM", "truecolor"),
];

pub struct PtyProcess {
    pub child: Box<dyn Child + Send + Sync>,
    pub killer: Box<dyn ChildKiller + Send + Sync>,
    pub master: Box<dyn MasterPty + Send>,
    pub writer: Box<dyn Write + Send>,
    pub reader: Box<dyn Read + Send>,
}

pub fn pty_size(size: PaneSize) -> PtySize {
    PtySize {
        rows: size.rows,
        cols: size.cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

fn shell_command(command: &str) -> CommandBuilder {
    #[cfg(unix)]
    {
        let mut cmd = CommandBuilder::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
    #[cfg(not(unix))]
    {
        let mut cmd = CommandBuilder::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }
}

pub fn spawn_in_pty(service: &ServiceDescriptor, size: PaneSize) -> Result<PtyProcess, SpawnError> {
    if !service.working_dir.is_dir() {
        return Err(SpawnError::WorkingDir(service.working_dir.clone()));
    }

    let pair = portable_pty::native_pty_system()
        .openpty(pty_size(size))
        .map_err(|err| SpawnError::OpenPty(err.to_string()))?;

    let mut cmd = shell_command(&service.command);
    cmd.cwd(&service.working_dir);
    for (key, value) in CHILD_ENV {
        cmd.env(key, value);
    }

    let child = pair
        .slave
        .spawn_command(cmd)
        .map_err(|err| SpawnError::Spawn {
            command: service.command.clone(),
            message: err.to_string(),
        })?;
    drop(pair.slave);

    let mut killer = child.clone_killer();
    let attached = pair
        .master
        .try_clone_reader()
        .and_then(|reader| Ok((reader, pair.master.take_writer()?)));
    let (reader, writer) = match attached {
        Ok(ends) => ends,
        Err(err) => {
            let _ = killer.kill();
            return Err(SpawnError::Attach(err.to_string()));
        }
    };

    Ok(PtyProcess {
        child,
        killer,
        master: pair.master,
        writer,
        reader,
    })
}
