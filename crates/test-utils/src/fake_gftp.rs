//! A shell script that behaves like the gftp binary.
//!
//! The script dispatches on its first argument (`--version`, `publish`,
//! `download`) and runs a configurable `sh` body for each. Bodies see the
//! remaining arguments as `$1`, `$2`, ...
//!
//! The default bodies implement a tiny "transfer": publish answers with
//! `gftp://fake<path>` URLs and serves until SIGINT, download copies the file
//! named by such a URL.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Publish every argument, then serve until interrupted (exit 0 on SIGINT).
pub const PUBLISH_AND_SERVE: &str = r#"trap 'exit 0' INT TERM
out=""
for f in "$@"; do
  entry="{\"file\":\"$f\",\"url\":\"gftp://fake$f\"}"
  if [ -z "$out" ]; then out="$entry"; else out="$out,$entry"; fi
done
if [ $# -eq 1 ]; then
  echo "{\"result\":$out}"
else
  echo "{\"result\":[$out]}"
fi
while true; do sleep 0.05; done
"#;

/// Copy the file behind a `gftp://fake<path>` URL, reporting progress.
///
/// The first progress object is written in two pieces to exercise line
/// reassembly, and a plain-text line precedes the events.
pub const COPY_WITH_PROGRESS: &str = r#"src="${1#gftp://fake}"
dst="$2"
echo "starting download of $1"
if [ ! -f "$src" ]; then
  echo '{"error":{"message":"file is not published"}}'
  exit 1
fi
size=$(wc -c < "$src" | tr -d ' ')
printf '{"cur":0,"tot":%s,' "$size"
sleep 0.05
printf '"spc":0,"spt":0,"elp":0}\n'
cp "$src" "$dst"
echo "{\"cur\":$size,\"tot\":$size,\"spc\":10,\"spt\":10,\"elp\":1}"
"#;

#[derive(Debug, Clone)]
pub struct FakeGftp {
    version_body: String,
    publish_body: String,
    download_body: String,
}

impl Default for FakeGftp {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGftp {
    pub fn new() -> Self {
        Self {
            version_body: "echo 'gftp 0.14.0 (fake build)'".to_string(),
            publish_body: PUBLISH_AND_SERVE.to_string(),
            download_body: COPY_WITH_PROGRESS.to_string(),
        }
    }

    pub fn on_version(mut self, body: &str) -> Self {
        self.version_body = body.to_string();
        self
    }

    pub fn on_publish(mut self, body: &str) -> Self {
        self.publish_body = body.to_string();
        self
    }

    pub fn on_download(mut self, body: &str) -> Self {
        self.download_body = body.to_string();
        self
    }

    pub fn script(&self) -> String {
        format!(
            "#!/bin/sh\n\
             cmd=\"$1\"\n\
             [ $# -gt 0 ] && shift\n\
             case \"$cmd\" in\n\
             --version)\n{}\n;;\n\
             publish)\n{}\n;;\n\
             download)\n{}\n;;\n\
             *)\necho \"unknown command: $cmd\" >&2\nexit 64\n;;\n\
             esac\n",
            self.version_body, self.publish_body, self.download_body
        )
    }

    /// Write the script as `dir/gftp` and make it executable.
    pub fn install(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join("gftp");
        fs::write(&path, self.script())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        }

        Ok(path)
    }
}
