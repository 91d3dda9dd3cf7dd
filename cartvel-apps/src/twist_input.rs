use std::io::BufRead;

use cartvel_controller::TwistCommander;
use cartvel_kinematics::Twist;
use tracing::{debug, warn};

use crate::Error;

/// Parses one line of `vx vy vz wx wy wz`.
///
/// Blank lines and lines starting with `#` give `None`. Values are not range
/// checked.
pub fn parse_twist_line(line: &str) -> Result<Option<Twist>, Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut twist = [0.0; 6];
    let mut len = 0;
    for value in line.split(|c: char| c.is_whitespace() || c == ',') {
        if value.is_empty() {
            continue;
        }
        if len == twist.len() {
            return Err(Error::InvalidTwist(
                line.to_owned(),
                "more than 6 values".to_owned(),
            ));
        }
        twist[len] = value
            .parse()
            .map_err(|e| Error::InvalidTwist(line.to_owned(), format!("{value:?}: {e}")))?;
        len += 1;
    }
    if len != twist.len() {
        return Err(Error::InvalidTwist(
            line.to_owned(),
            format!("expected 6 values, got {len}"),
        ));
    }
    Ok(Some(Twist::from_array(twist)))
}

/// Forwards every twist line of `reader` to `commander` until end of input.
///
/// Malformed lines are logged and skipped. Returns the number of twists sent.
pub fn forward_twists<R: BufRead>(reader: R, commander: &TwistCommander) -> std::io::Result<usize> {
    let mut sent = 0;
    for line in reader.lines() {
        match parse_twist_line(&line?) {
            Ok(Some(twist)) => {
                debug!(?twist, "desired twist");
                commander.send(twist);
                sent += 1;
            }
            Ok(None) => {}
            Err(e) => warn!("{e}"),
        }
    }
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cartvel_controller::DesiredTwist;

    use super::*;

    #[test]
    fn test_parse_twist_line() {
        let twist = parse_twist_line("0.1 0 -0.2  0 0 1.5\n").unwrap().unwrap();
        assert_eq!(twist.to_array(), [0.1, 0.0, -0.2, 0.0, 0.0, 1.5]);
        let twist = parse_twist_line("1,2,3,4,5,6").unwrap().unwrap();
        assert_eq!(twist.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        assert!(parse_twist_line("").unwrap().is_none());
        assert!(parse_twist_line("   # comment").unwrap().is_none());

        assert!(matches!(
            parse_twist_line("1 2 3"),
            Err(Error::InvalidTwist(..))
        ));
        assert!(matches!(
            parse_twist_line("1 2 3 4 5 6 7"),
            Err(Error::InvalidTwist(..))
        ));
        assert!(matches!(
            parse_twist_line("1 2 3 4 5 x"),
            Err(Error::InvalidTwist(..))
        ));
    }

    #[test]
    fn test_forward_twists() {
        let desired = Arc::new(DesiredTwist::new());
        let commander = TwistCommander::new(desired.clone());
        let input = "1 0 0 0 0 0\nbad line\n\n0 0 0 0 0 2\n";
        assert_eq!(forward_twists(input.as_bytes(), &commander).unwrap(), 2);
        assert_eq!(desired.load().to_array(), [0.0, 0.0, 0.0, 0.0, 0.0, 2.0]);
    }
}
