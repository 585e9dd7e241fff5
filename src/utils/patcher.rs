/// Line-by-line reader and in-place rewriter for descriptor and manifest files
use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy)]
pub struct PatchOptions {
    /// Remove every `'` from handler output before writing it
    pub strip_single_quotes: bool,
    /// Only feed lines to the handler, leave the file alone
    pub read_only: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        PatchOptions {
            strip_single_quotes: true,
            read_only: false,
        }
    }
}

impl PatchOptions {
    pub fn read_only() -> Self {
        PatchOptions {
            read_only: true,
            ..Default::default()
        }
    }
}

/// A non-blank line as seen by a handler
#[derive(Debug)]
pub struct Line<'a> {
    /// Normalized first token: no `"` or `:`, lowercase
    pub section: String,
    /// The whole line, line ending included
    pub raw: &'a str,
    pub words: Vec<&'a str>,
}

impl<'a> Line<'a> {
    pub fn parse(raw: &'a str) -> Option<Self> {
        let words: Vec<&str> = raw.split_whitespace().collect();
        let first = words.first()?;
        Some(Line {
            section: section_key(first),
            raw,
            words,
        })
    }
}

pub fn section_key(token: &str) -> String {
    token.replace(&['"', ':'][..], "").to_lowercase()
}

/// Call `handler` once for every non-blank line of `path`, in order.
///
/// Unless `opts.read_only` is set, each line is replaced by what the handler
/// returns. Blank lines are copied without calling the handler. Any state
/// that has to survive between lines lives in `state`.
pub fn for_each_line<S, F>(path: &Path, state: &mut S, handler: F, opts: PatchOptions) -> Result<()>
where
    F: Fn(&mut S, &Line) -> Result<String>,
{
    let f = File::open(path).context(format!("Failed to open {}", path.display()))?;
    let mut reader = BufReader::new(f);

    if opts.read_only {
        return walk(&mut reader, state, handler, None, opts);
    }

    let tmp_path = temp_path(path);
    let res = (|| -> Result<()> {
        let tmp = File::create(&tmp_path)
            .context(format!("Failed to create {}", tmp_path.display()))?;
        let mut writer = BufWriter::new(tmp);
        walk(&mut reader, state, handler, Some(&mut writer), opts)?;
        writer.flush()?;
        let permissions = fs::metadata(path)?.permissions();
        fs::set_permissions(&tmp_path, permissions)?;
        fs::rename(&tmp_path, path).context(format!("Failed to replace {}", path.display()))
    })();
    if res.is_err() && tmp_path.exists() {
        let _ = fs::remove_file(&tmp_path);
    }
    res
}

fn walk<S, F, R>(
    reader: &mut R,
    state: &mut S,
    handler: F,
    mut writer: Option<&mut dyn Write>,
    opts: PatchOptions,
) -> Result<()>
where
    F: Fn(&mut S, &Line) -> Result<String>,
    R: BufRead,
{
    let mut buf = String::new();
    let mut lineno = 0;
    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            break;
        }
        lineno += 1;

        let output = match Line::parse(&buf) {
            Some(line) => {
                let mut res = handler(state, &line).context(format!("At line {}", lineno))?;
                if opts.strip_single_quotes {
                    res.retain(|c| c != '\'');
                }
                res
            }
            None => buf.clone(),
        };
        if let Some(w) = writer.as_mut() {
            w.write_all(output.as_bytes())?;
        }
    }
    Ok(())
}

/// Sibling of `path`, so the final rename stays on one filesystem
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.texbump", name))
}
