pub mod logger {
    use std::fmt::Display;

    use console::style;

    use crate::config::global_config;

    pub fn intro() {
        println!("{}", style("chaincode").bold().cyan());
    }

    pub fn outro(msg: impl Display) {
        println!("{} {}", style("✔").green(), msg);
    }

    pub fn info(msg: impl Display) {
        println!("{}", msg);
    }

    pub fn warn(msg: impl Display) {
        println!("{} {}", style("warning:").yellow().bold(), msg);
    }

    /// Printed only with --verbose.
    pub fn debug(msg: impl Display) {
        if global_config().verbose {
            println!("{}", style(msg).dim());
        }
    }

    pub fn new_empty_line() {
        println!();
    }
}

pub mod error {
    use console::style;

    /// Print an anyhow error and its cause chain to stderr.
    pub fn log_error(error: anyhow::Error) {
        eprintln!("{} {}", style("error:").red().bold(), error);
        for cause in error.chain().skip(1) {
            eprintln!("  {} {}", style("caused by:").red(), cause);
        }
    }
}
