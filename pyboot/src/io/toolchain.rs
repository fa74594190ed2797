//! Command-line rendering for the interpreter and environment manager.
//!
//! Only the strings live here; execution goes through [`crate::io::shell::Shell`].

use crate::io::config::BootstrapConfig;

/// How scripts and `pip` are invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpreter {
    /// Whatever `python_command` resolves to on `PATH`.
    Global { python: String },
    /// Interpreter inside a conda prefix relative to the project.
    Conda { prefix: String },
}

impl Interpreter {
    pub fn from_config(cfg: &BootstrapConfig) -> Self {
        if cfg.conda {
            Interpreter::Conda {
                prefix: env_prefix(&cfg.env_dir),
            }
        } else {
            Self::global(cfg)
        }
    }

    /// The configured interpreter on `PATH`, ignoring isolation.
    pub fn global(cfg: &BootstrapConfig) -> Self {
        Interpreter::Global {
            python: cfg.python_command.clone(),
        }
    }

    /// Command prefix that runs the interpreter.
    pub fn python(&self) -> String {
        match self {
            Interpreter::Global { python } => python.clone(),
            Interpreter::Conda { prefix } => {
                if cfg!(target_os = "windows") {
                    format!("call conda activate {prefix} && python")
                } else {
                    format!("conda run --no-capture-output --prefix {prefix} python")
                }
            }
        }
    }

    /// `<python> -m pip install <args>`.
    pub fn pip_install(&self, args: &str) -> String {
        format!("{} -m pip install {}", self.python(), args.trim())
    }

    /// `<python> -m pip install -r <manifest>`.
    pub fn pip_install_manifest(&self, manifest: &str) -> String {
        self.pip_install(&format!("-r {}", quote_arg(manifest)))
    }

    /// `<python> <entry>`.
    pub fn run_script(&self, entry: &str) -> String {
        format!("{} {}", self.python(), quote_arg(entry))
    }
}

/// `./<env_dir>` unless `env_dir` is already a path.
pub fn env_prefix(env_dir: &str) -> String {
    if env_dir.starts_with('.') || env_dir.starts_with('/') || env_dir.contains(':') {
        quote_arg(env_dir)
    } else {
        quote_arg(&format!("./{env_dir}"))
    }
}

/// Create an isolated environment from a definition file into `env_dir`.
pub fn create_env_from_file(definition: &str, env_dir: &str) -> String {
    format!(
        "conda env create -f {} --prefix {}",
        quote_arg(definition),
        env_prefix(env_dir)
    )
}

/// Create a bare isolated environment pinned to `python_version`.
pub fn create_bare_env(env_dir: &str, python_version: &str) -> String {
    format!(
        "conda create --prefix {} python={} -y",
        env_prefix(env_dir),
        python_version.trim()
    )
}

/// Quote an argument containing whitespace for the platform shell.
pub fn quote_arg(arg: &str) -> String {
    if arg.chars().any(char::is_whitespace) {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_interpreter_uses_configured_python() {
        let cfg = BootstrapConfig {
            python_command: "python3".to_string(),
            ..BootstrapConfig::default()
        };
        let interp = Interpreter::from_config(&cfg);
        assert_eq!(interp.pip_install("Pillow"), "python3 -m pip install Pillow");
        assert_eq!(interp.run_script("main.py"), "python3 main.py");
        assert_eq!(
            interp.pip_install_manifest("requirements.txt"),
            "python3 -m pip install -r requirements.txt"
        );
    }

    #[cfg(unix)]
    #[test]
    fn conda_interpreter_runs_inside_prefix() {
        let cfg = BootstrapConfig {
            conda: true,
            ..BootstrapConfig::default()
        };
        let interp = Interpreter::from_config(&cfg);
        assert_eq!(
            interp.run_script("main.py"),
            "conda run --no-capture-output --prefix ./venv python main.py"
        );
    }

    #[test]
    fn environment_commands_target_prefix() {
        assert_eq!(
            create_env_from_file("environment.yml", "venv"),
            "conda env create -f environment.yml --prefix ./venv"
        );
        assert_eq!(
            create_bare_env("venv", "3.11"),
            "conda create --prefix ./venv python=3.11 -y"
        );
    }

    #[test]
    fn whitespace_arguments_are_quoted() {
        assert_eq!(quote_arg("my app.py"), "\"my app.py\"");
        assert_eq!(quote_arg("app.py"), "app.py");
        assert_eq!(env_prefix(".envs/py"), ".envs/py");
    }
}
