use std::io::{BufRead, Write};

use tracing::debug;

use crate::aws::ec2::InstanceRecord;
use crate::errors::RoostError;

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Index into the candidate list.
    Chosen(usize),
    /// The operator picked `0`: stop here, no connection, exit clean.
    Abort,
}

/// Disambiguate among the candidates. Zero fails, one auto-selects without
/// prompting, more than one enumerates and reads a number back. Replies
/// outside `[0, N]` are rejected, never clamped.
pub fn choose<R: BufRead, W: Write>(
    instances: &[InstanceRecord],
    using_vpn: bool,
    filter_desc: &str,
    input: &mut R,
    output: &mut W,
) -> Result<Selection, RoostError> {
    match instances.len() {
        0 => Err(RoostError::NoInstanceFound(filter_desc.to_string())),
        1 => {
            debug!(id = %instances[0].id, "single candidate, auto-selected");
            Ok(Selection::Chosen(0))
        }
        count => {
            writeln!(output, "0) None, I will filter more")?;
            for (position, instance) in instances.iter().enumerate() {
                writeln!(
                    output,
                    "{}) {} - {}",
                    position + 1,
                    instance.id,
                    instance.address(using_vpn).unwrap_or("-")
                )?;
            }
            write!(output, "Please choose an instance: ")?;
            output.flush()?;

            let mut line = String::new();
            input.read_line(&mut line)?;
            let reply = line.trim();

            match reply.parse::<i64>() {
                Ok(0) => Ok(Selection::Abort),
                Ok(n) if n >= 1 && (n as usize) <= count => Ok(Selection::Chosen(n as usize - 1)),
                _ => Err(RoostError::InvalidSelection {
                    given: reply.to_string(),
                    max: count,
                }),
            }
        }
    }
}

/// Same contract, wired to the real terminal.
pub fn choose_interactive(
    instances: &[InstanceRecord],
    using_vpn: bool,
    filter_desc: &str,
) -> Result<Selection, RoostError> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    choose(instances, using_vpn, filter_desc, &mut input, &mut output)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Cursor;

    use super::*;

    fn record(id: &str, public_ip: Option<&str>, private_ip: Option<&str>) -> InstanceRecord {
        InstanceRecord {
            id: id.to_string(),
            public_ip: public_ip.map(str::to_string),
            private_ip: private_ip.map(str::to_string),
            state: "running".to_string(),
            key_name: None,
            tags: HashMap::new(),
        }
    }

    fn three() -> Vec<InstanceRecord> {
        vec![
            record("i-1", Some("203.0.113.1"), Some("10.0.0.1")),
            record("i-2", Some("203.0.113.2"), Some("10.0.0.2")),
            record("i-3", None, Some("10.0.0.3")),
        ]
    }

    fn choose_with(
        instances: &[InstanceRecord],
        using_vpn: bool,
        reply: &str,
    ) -> (Result<Selection, RoostError>, String) {
        let mut input = Cursor::new(reply.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = choose(instances, using_vpn, "tag(s) env=prod", &mut input, &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_empty_list_fails() {
        let (result, output) = choose_with(&[], false, "");
        assert_eq!(
            result,
            Err(RoostError::NoInstanceFound("tag(s) env=prod".to_string()))
        );
        assert!(output.is_empty());
    }

    #[test]
    fn test_single_candidate_auto_selects_silently() {
        let instances = vec![record("i-1", Some("203.0.113.1"), None)];
        let (result, output) = choose_with(&instances, false, "");
        assert_eq!(result, Ok(Selection::Chosen(0)));
        assert!(output.is_empty());
    }

    #[test]
    fn test_prompt_enumerates_from_zero() {
        let (result, output) = choose_with(&three(), false, "2\n");
        assert_eq!(result, Ok(Selection::Chosen(1)));
        assert_eq!(
            output,
            "0) None, I will filter more\n\
             1) i-1 - 203.0.113.1\n\
             2) i-2 - 203.0.113.2\n\
             3) i-3 - -\n\
             Please choose an instance: "
        );
    }

    #[test]
    fn test_prompt_shows_private_addresses_on_vpn() {
        let (_, output) = choose_with(&three(), true, "1\n");
        assert!(output.contains("1) i-1 - 10.0.0.1"));
        assert!(output.contains("3) i-3 - 10.0.0.3"));
    }

    #[test]
    fn test_zero_aborts() {
        let (result, _) = choose_with(&three(), false, "0\n");
        assert_eq!(result, Ok(Selection::Abort));
    }

    #[test]
    fn test_lower_bound_picks_first() {
        let (result, _) = choose_with(&three(), false, "1\n");
        assert_eq!(result, Ok(Selection::Chosen(0)));
    }

    #[test]
    fn test_upper_bound_inclusive() {
        let (result, _) = choose_with(&three(), false, "3\n");
        assert_eq!(result, Ok(Selection::Chosen(2)));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let (result, _) = choose_with(&three(), false, "4\n");
        assert_eq!(
            result,
            Err(RoostError::InvalidSelection {
                given: "4".to_string(),
                max: 3,
            })
        );
    }

    #[test]
    fn test_negative_rejected() {
        let (result, _) = choose_with(&three(), false, "-1\n");
        assert_eq!(
            result,
            Err(RoostError::InvalidSelection {
                given: "-1".to_string(),
                max: 3,
            })
        );
    }

    #[test]
    fn test_non_integer_rejected() {
        let (result, _) = choose_with(&three(), false, "two\n");
        assert_eq!(
            result,
            Err(RoostError::InvalidSelection {
                given: "two".to_string(),
                max: 3,
            })
        );
    }

    #[test]
    fn test_end_of_input_rejected() {
        let (result, _) = choose_with(&three(), false, "");
        assert_eq!(
            result,
            Err(RoostError::InvalidSelection {
                given: String::new(),
                max: 3,
            })
        );
    }

    #[test]
    fn test_reply_whitespace_is_trimmed() {
        let (result, _) = choose_with(&three(), false, "  2  \n");
        assert_eq!(result, Ok(Selection::Chosen(1)));
    }
}
