use std::ffi::OsString;
use std::io::{Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Stdio};
use std::thread::JoinHandle;

use anyhow::Context;

use crate::foundation::error::{MontageError, MontageResult};
use crate::media::config::MediaConfig;

/// Which end of the subprocess carries the media stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PipeMode {
    /// We write raw data to the process stdin (encoders).
    Feed,
    /// We read raw data from the process stdout (decoders).
    Drain,
}

/// One `ffmpeg` subprocess with its stream pipe and a stderr drain thread.
///
/// Dropping the value terminates the process and reaps it, so no exit path leaks a child.
pub(crate) struct FfmpegProcess {
    command_line: String,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl FfmpegProcess {
    pub(crate) fn spawn(
        cfg: &MediaConfig,
        args: &[OsString],
        mode: PipeMode,
    ) -> MontageResult<Self> {
        let command_line = render_command_line(cfg, args);
        tracing::debug!(command = %command_line, "spawning ffmpeg");

        let mut cmd = cfg.command();
        cmd.args(args).stderr(Stdio::piped());
        match mode {
            PipeMode::Feed => cmd.stdin(Stdio::piped()).stdout(Stdio::null()),
            PipeMode::Drain => cmd.stdin(Stdio::null()).stdout(Stdio::piped()),
        };

        let mut child = cmd.spawn().with_context(|| {
            format!(
                "failed to spawn '{}' (is it installed and on PATH?)",
                cfg.ffmpeg_binary.display()
            )
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MontageError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        Ok(Self {
            command_line,
            child: Some(child),
            stdin,
            stdout,
            stderr_drain: Some(stderr_drain),
        })
    }

    /// Push bytes to the process stdin, blocking while its input buffer is full.
    pub(crate) fn write_all(&mut self, bytes: &[u8]) -> MontageResult<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(MontageError::encode("ffmpeg stdin is already closed"));
        };
        if let Err(e) = stdin.write_all(bytes) {
            let stderr = self.terminate();
            return Err(MontageError::encode(format!(
                "failed to write to ffmpeg stdin: {e}\n{}{}",
                stderr.trim(),
                failure_hint(&stderr)
            )));
        }
        Ok(())
    }

    /// Close stdin, wait for exit, and fail with the captured stderr on a non-zero status.
    pub(crate) fn finish(mut self) -> MontageResult<()> {
        drop(self.stdin.take());
        drop(self.stdout.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| MontageError::encode("ffmpeg process already finished"))?;
        let status = child.wait().context("failed to wait for ffmpeg to finish")?;
        let stderr = self.collect_stderr();

        if !status.success() {
            return Err(MontageError::encode(format!(
                "ffmpeg exited with status {status}: {}{}\ncommand: {}",
                stderr.trim(),
                failure_hint(&stderr),
                self.command_line
            )));
        }
        Ok(())
    }

    /// Kill the process if it is still running and return whatever it wrote to stderr.
    fn terminate(&mut self) -> String {
        drop(self.stdin.take());
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!(error = %e, "ffmpeg already exited");
            }
            if let Err(e) = child.wait() {
                tracing::warn!(error = %e, "failed to reap ffmpeg process");
            }
        }
        self.collect_stderr()
    }

    fn collect_stderr(&mut self) -> String {
        let bytes = match self.stderr_drain.take().map(JoinHandle::join) {
            Some(Ok(Ok(bytes))) => bytes,
            Some(Ok(Err(e))) => format!("<stderr read failed: {e}>").into_bytes(),
            Some(Err(_)) => b"<stderr drain thread panicked>".to_vec(),
            None => Vec::new(),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Read for FfmpegProcess {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.stdout.as_mut() {
            Some(stdout) => stdout.read(buf),
            None => Ok(0),
        }
    }
}

impl Drop for FfmpegProcess {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.terminate();
        }
    }
}

/// Run `ffmpeg` to completion and return its stderr, failing on a non-zero exit status.
pub(crate) fn run_to_completion(cfg: &MediaConfig, args: &[OsString]) -> MontageResult<String> {
    let command_line = render_command_line(cfg, args);
    tracing::debug!(command = %command_line, "running ffmpeg");
    let output = cfg
        .command()
        .args(args)
        .stdin(Stdio::null())
        .output()
        .with_context(|| {
            format!(
                "failed to spawn '{}' (is it installed and on PATH?)",
                cfg.ffmpeg_binary.display()
            )
        })?;
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if !output.status.success() {
        return Err(MontageError::encode(format!(
            "ffmpeg exited with status {}: {}{}\ncommand: {command_line}",
            output.status,
            stderr.trim(),
            failure_hint(&stderr)
        )));
    }
    Ok(stderr)
}

/// Extra explanation for the usual causes of an encoder failure.
pub(crate) fn failure_hint(stderr: &str) -> &'static str {
    if stderr.contains("Unknown encoder") {
        "\nhint: this ffmpeg build does not provide the requested codec; pick another codec \
         or install an ffmpeg with that encoder"
    } else if stderr.contains("incorrect codec parameters") {
        "\nhint: the codec may not be compatible with the output file extension"
    } else if stderr.contains("encoder setting") {
        "\nhint: the requested bitrate may not be supported by this codec"
    } else if stderr.contains("Invalid encoder type") {
        "\nhint: the codec given is not a codec for this kind of stream"
    } else {
        ""
    }
}

pub(crate) fn render_command_line(cfg: &MediaConfig, args: &[OsString]) -> String {
    let mut line = cfg.ffmpeg_binary.display().to_string();
    for a in args {
        line.push(' ');
        line.push_str(&a.to_string_lossy());
    }
    line
}

#[cfg(test)]
#[path = "../../tests/unit/media/process.rs"]
mod tests;
