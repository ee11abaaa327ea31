// ─── Classpath Builder ───
// Builds the `-classpath "<entries>" <main class>` or `-jar "<file>"` section
// of the runtime command line.

use std::fs::ReadDir;
use std::path::Path;

use tracing::debug;

use crate::core::config::LauncherConfig;
use crate::core::error::LauncherResult;

use super::expand::ExpansionContext;

const CLASSPATH_SEPARATOR: char = ';';

/// Produce the main-class or jar arguments for `config`.
pub fn build_main_arguments(
    config: &LauncherConfig,
    exe_path: &Path,
    expansion: &ExpansionContext<'_>,
) -> LauncherResult<String> {
    let main_class = config
        .main_class
        .as_deref()
        .map(str::trim)
        .filter(|main_class| !main_class.is_empty());

    if let Some(main_class) = main_class {
        debug!("Main class: {}", main_class);
        if config.classpath.trim().is_empty() {
            debug!("Info: Classpath not defined.");
        }

        let expanded = expansion.expand(&config.classpath)?;
        let mut entries = Vec::new();
        if config.wrapper {
            entries.push(exe_path.to_string_lossy().into_owned());
        } else if !config.jar.is_empty() {
            entries.push(config.jar.clone());
        }
        for token in expanded
            .split(CLASSPATH_SEPARATOR)
            .filter(|token| !token.is_empty())
        {
            debug!("Add classpath: {}", token);
            if is_wildcard(token) {
                entries.extend(WildcardMatches::new(token).inspect(|entry| {
                    debug!("      \"      : {}", entry);
                }));
            } else {
                entries.push(token.to_string());
            }
        }

        let separator = CLASSPATH_SEPARATOR.to_string();
        return Ok(format!(
            "-classpath \"{}\" {}",
            entries.join(&separator),
            main_class
        ));
    }

    if config.wrapper {
        return Ok(format!("-jar \"{}\"", exe_path.display()));
    }

    let exe_dir = exe_path.parent().unwrap_or_else(|| Path::new(""));
    Ok(format!("-jar \"{}\"", exe_dir.join(&config.jar).display()))
}

fn is_wildcard(token: &str) -> bool {
    token.contains(['*', '?'])
}

/// Files in the token's directory whose names match its last segment.
///
/// Entries come out in directory read order; the sequence is finite and not
/// restartable. Directories, unreadable entries and a missing directory
/// contribute nothing.
pub struct WildcardMatches {
    prefix: String,
    pattern: Vec<char>,
    entries: Option<ReadDir>,
}

impl WildcardMatches {
    pub fn new(token: &str) -> Self {
        let split = token.rfind(['\\', '/']).map(|idx| idx + 1).unwrap_or(0);
        let (prefix, pattern) = token.split_at(split);
        let dir = if prefix.is_empty() { "." } else { prefix };

        Self {
            prefix: prefix.to_string(),
            pattern: pattern.to_lowercase().chars().collect(),
            entries: std::fs::read_dir(dir).ok(),
        }
    }
}

impl Iterator for WildcardMatches {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let entries = self.entries.as_mut()?;
        for entry in entries.by_ref() {
            let Ok(entry) = entry else { continue };
            if entry.file_type().map(|kind| kind.is_dir()).unwrap_or(true) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let candidate: Vec<char> = name.to_lowercase().chars().collect();
            if wildcard_match(&self.pattern, &candidate) {
                return Some(format!("{}{}", self.prefix, name));
            }
        }
        self.entries = None;
        None
    }
}

/// `*` matches any run of characters, `?` exactly one.
fn wildcard_match(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::core::java::paths::LaunchContext;
    use crate::core::java::registry::NoRegistry;

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    #[test]
    fn wildcard_patterns() {
        assert!(wildcard_match(&chars("*.jar"), &chars("app.jar")));
        assert!(wildcard_match(&chars("lib-?.jar"), &chars("lib-1.jar")));
        assert!(wildcard_match(&chars("*"), &chars("anything")));
        assert!(wildcard_match(&chars("a*b*c"), &chars("axxbyyc")));
        assert!(!wildcard_match(&chars("*.jar"), &chars("app.zip")));
        assert!(!wildcard_match(&chars("lib-?.jar"), &chars("lib-10.jar")));
    }

    #[test]
    fn glob_matching_nothing_contributes_nothing() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        let token = format!("{}/*.jar", dir.display());
        assert_eq!(WildcardMatches::new(&token).count(), 0);

        let missing = format!("{}/missing/*.jar", dir.display());
        assert_eq!(WildcardMatches::new(&missing).count(), 0);
    }

    #[test]
    fn glob_yields_matching_files_only() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        std::fs::write(dir.join("a.jar"), b"").unwrap();
        std::fs::write(dir.join("B.JAR"), b"").unwrap();
        std::fs::write(dir.join("notes.txt"), b"").unwrap();
        std::fs::create_dir_all(dir.join("nested.jar")).unwrap();

        let token = format!("{}/*.jar", dir.display());
        let mut found: Vec<String> = WildcardMatches::new(&token).collect();
        found.sort();
        assert_eq!(
            found,
            vec![
                format!("{}/B.JAR", dir.display()),
                format!("{}/a.jar", dir.display())
            ]
        );
    }

    #[test]
    fn main_class_with_wrapper_and_wildcards() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        std::fs::create_dir_all(dir.join("lib")).unwrap();
        std::fs::write(dir.join("lib").join("dep.jar"), b"").unwrap();

        let exe = dir.join("app.exe");
        let launch = LaunchContext::new(exe.clone(), dir.to_path_buf());
        let expansion = ExpansionContext::new(&launch, &NoRegistry, true);
        let config = LauncherConfig {
            main_class: Some("com.acme.Main".to_string()),
            classpath: "%EXEDIR%/lib/*.jar;conf;".to_string(),
            wrapper: true,
            ..LauncherConfig::default()
        };

        let args = build_main_arguments(&config, &exe, &expansion).unwrap();
        assert_eq!(
            args,
            format!(
                "-classpath \"{};{}/lib/dep.jar;conf\" com.acme.Main",
                exe.display(),
                dir.display()
            )
        );
    }

    #[test]
    fn jar_is_first_classpath_entry() {
        let exe = PathBuf::from("/opt/app/app.exe");
        let launch = LaunchContext::new(exe.clone(), PathBuf::from("/"));
        let expansion = ExpansionContext::new(&launch, &NoRegistry, true);
        let config = LauncherConfig {
            main_class: Some("Main".to_string()),
            jar: "app.jar".to_string(),
            classpath: "lib/x.jar".to_string(),
            ..LauncherConfig::default()
        };
        assert_eq!(
            build_main_arguments(&config, &exe, &expansion).unwrap(),
            "-classpath \"app.jar;lib/x.jar\" Main"
        );
    }

    #[test]
    fn jar_modes() {
        let exe = PathBuf::from("/opt/app/app.exe");
        let launch = LaunchContext::new(exe.clone(), PathBuf::from("/"));
        let expansion = ExpansionContext::new(&launch, &NoRegistry, true);

        let wrapper = LauncherConfig {
            wrapper: true,
            ..LauncherConfig::default()
        };
        assert_eq!(
            build_main_arguments(&wrapper, &exe, &expansion).unwrap(),
            format!("-jar \"{}\"", exe.display())
        );

        let external = LauncherConfig {
            jar: "app.jar".to_string(),
            ..LauncherConfig::default()
        };
        assert_eq!(
            build_main_arguments(&external, &exe, &expansion).unwrap(),
            format!("-jar \"{}\"", Path::new("/opt/app").join("app.jar").display())
        );
    }
}
