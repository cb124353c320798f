//! p4gate CLI application entry point
//!
//! Delegates to the library and turns failures into exit codes:
//! 1 for recoverable errors, 2 for critical ones. Critical failures are
//! printed by the console reporter before they get here.

use clap::Parser;

fn main() {
    // Configure miette for error reporting
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(false)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))
    .ok();

    let cli = p4gate::Cli::parse();

    if let Err(e) = p4gate::run(cli) {
        if p4gate::is_reported(&e) {
            std::process::exit(p4gate::exit_code(&e));
        }
        let report = match p4gate::remediation(&e) {
            Some(help) => miette::miette!(help = help, "{e:#}"),
            None => miette::Report::msg(format!("{e:#}")),
        };
        eprintln!("{report:?}");
        std::process::exit(p4gate::exit_code(&e));
    }
}
