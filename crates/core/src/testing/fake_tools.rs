//! Shell scripts standing in for the external encoders.

use std::path::{Path, PathBuf};

use crate::config::ToolsConfig;

/// Installs fake `flac`, `sox` and `lame` executables into a directory.
///
/// Decoders copy the source file to stdout; encoders copy stdin to the
/// destination argument. Outputs are therefore byte copies of the sources.
#[derive(Debug, Clone, Default)]
pub struct FakeTools {
    fail_marker: Option<String>,
    delay_ms: u64,
    corrupt_output: bool,
}

impl FakeTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes encoders exit 1 when their input contains `marker`.
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    /// Makes encoders sleep before finishing.
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Makes encoders consume their input but write bytes that no tag
    /// reader accepts, while still exiting 0.
    pub fn corrupting_output(mut self) -> Self {
        self.corrupt_output = true;
        self
    }

    /// Writes the scripts into `dir` and returns a config pointing at them.
    pub fn install(&self, dir: &Path) -> std::io::Result<ToolsConfig> {
        std::fs::create_dir_all(dir)?;

        // flac decodes with `-dcs -- <src>` and encodes with `-s -8 -o <dest> -`
        let flac = write_script(
            dir,
            "flac",
            &format!(
                "if [ \"$1\" = \"-dcs\" ]; then exec cat \"$3\"; fi\nout=\"$4\"\n{}",
                self.encode_snippet()
            ),
        )?;
        let sox = write_script(dir, "sox", "exec cat \"$1\"\n")?;
        // lame takes the destination last
        let lame = write_script(
            dir,
            "lame",
            &format!("for out; do :; done\n{}", self.encode_snippet()),
        )?;

        Ok(ToolsConfig { flac, sox, lame })
    }

    fn encode_snippet(&self) -> String {
        let mut script = String::from("cat > \"$out\" || exit 1\n");
        if self.corrupt_output {
            script.push_str("printf 'not audio' > \"$out\"\n");
        }
        if self.delay_ms > 0 {
            script.push_str(&format!(
                "sleep {}.{:03}\n",
                self.delay_ms / 1000,
                self.delay_ms % 1000
            ));
        }
        if let Some(marker) = &self.fail_marker {
            script.push_str(&format!(
                "if grep -q '{}' \"$out\"; then echo \"encoder: corrupt input\" >&2; exit 1; fi\n",
                marker
            ));
        }
        script
    }
}

fn write_script(dir: &Path, name: &str, body: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}", body))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(path)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_fake_encoder_copies_stdin() {
        let temp = tempfile::TempDir::new().unwrap();
        let tools = FakeTools::new().install(&temp.path().join("bin")).unwrap();
        let out = temp.path().join("out.mp3");

        let status = Command::new("sh")
            .arg("-c")
            .arg(format!(
                "printf hello | '{}' -S - '{}'",
                tools.lame.display(),
                out.display()
            ))
            .status()
            .unwrap();
        assert!(status.success());
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "hello");
    }

    #[test]
    fn test_corrupting_encoder_succeeds_with_garbage() {
        let temp = tempfile::TempDir::new().unwrap();
        let tools = FakeTools::new()
            .corrupting_output()
            .install(&temp.path().join("bin"))
            .unwrap();
        let out = temp.path().join("out.flac");

        let status = Command::new("sh")
            .arg("-c")
            .arg(format!(
                "printf 'fLaC' | '{}' -s -8 -o '{}' -",
                tools.flac.display(),
                out.display()
            ))
            .status()
            .unwrap();
        assert!(status.success());
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "not audio");
    }

    #[test]
    fn test_failing_encoder() {
        let temp = tempfile::TempDir::new().unwrap();
        let tools = FakeTools::new()
            .failing_on("BROKEN")
            .install(&temp.path().join("bin"))
            .unwrap();

        let status = Command::new("sh")
            .arg("-c")
            .arg(format!(
                "printf 'xxBROKENxx' | '{}' -s -8 -o '{}' -",
                tools.flac.display(),
                temp.path().join("out.flac").display()
            ))
            .status()
            .unwrap();
        assert_eq!(status.code(), Some(1));
    }
}
