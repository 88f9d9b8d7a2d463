mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use controller_core::config::ControllerConfig;
use controller_core::sequence::PhaseDurations;
use session::{Session, SessionOptions};

const USAGE: &str = "Usage: controller-emulator [--red-ms <ms>] [--yellow-ms <ms>] \
                     [--green-ms <ms>] [--debounce-ms <ms>] [--transcript <path>]";

fn main() -> io::Result<()> {
    let options = parse_options(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut session = Session::new(options)?;
    let mut line = String::new();

    writeln!(
        writer,
        "Traffic light emulator ready. Type `help` for directives or `exit` to quit."
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        let responses = session.handle_command(trimmed)?;
        for response in responses {
            writeln!(writer, "{response}")?;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_options<A>(args: A) -> Result<SessionOptions, String>
where
    A: IntoIterator<Item = String>,
{
    let defaults = PhaseDurations::DEFAULT;
    let mut red = duration_millis(defaults.red);
    let mut yellow = duration_millis(defaults.yellow);
    let mut green = duration_millis(defaults.green);
    let mut config = ControllerConfig::DEFAULT;
    let mut transcript = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg, None),
        };
        let mut value = || {
            inline
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| format!("Expected value after {flag}"))
        };

        match flag.as_str() {
            "--red-ms" => red = parse_millis(&flag, &value()?)?,
            "--yellow-ms" => yellow = parse_millis(&flag, &value()?)?,
            "--green-ms" => green = parse_millis(&flag, &value()?)?,
            "--debounce-ms" => {
                let millis = parse_millis(&flag, &value()?)?;
                config = config.with_debounce_window(Duration::from_millis(u64::from(millis)));
            }
            "--transcript" => transcript = Some(PathBuf::from(value()?)),
            other => return Err(format!("Unknown option `{other}`")),
        }
    }

    Ok(SessionOptions {
        config: config.with_durations(PhaseDurations::from_millis(red, yellow, green)),
        transcript,
        transcript_header: None,
    })
}

fn parse_millis(flag: &str, value: &str) -> Result<u32, String> {
    value
        .parse::<u32>()
        .map_err(|_| format!("Invalid value `{value}` for {flag}: expected milliseconds"))
}

fn duration_millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| (*arg).to_string()).collect()
    }

    #[test]
    fn defaults_without_flags() {
        let options = parse_options(Vec::new()).unwrap();
        assert_eq!(options.config, ControllerConfig::DEFAULT);
        assert!(options.transcript.is_none());
    }

    #[test]
    fn both_flag_spellings_are_accepted() {
        let options = parse_options(args(&[
            "--red-ms=100",
            "--yellow-ms",
            "50",
            "--debounce-ms=20",
            "--transcript",
            "out/session.log",
        ]))
        .unwrap();

        assert_eq!(
            options.config.durations,
            PhaseDurations::from_millis(100, 50, 2000)
        );
        assert_eq!(options.config.debounce_window, Duration::from_millis(20));
        assert_eq!(options.transcript, Some(PathBuf::from("out/session.log")));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(parse_options(args(&["--red-ms=-5"])).is_err());
        assert!(parse_options(args(&["--green-ms"])).is_err());
        assert!(parse_options(args(&["--speed=3"])).is_err());
    }
}
