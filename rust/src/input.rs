use std::io::BufRead;

use crate::error::InputError;

pub const PROMPT: &str =
    "Enter the total number of tosses: (entered number should be divisible by number of processes)";

/// Read the total sample budget from the first whitespace-separated token of
/// the next line.
pub fn read_budget<R: BufRead + ?Sized>(reader: &mut R) -> Result<u64, InputError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(InputError::Missing);
    }

    let token = line.split_whitespace().next().ok_or(InputError::Missing)?;
    let budget = token.parse::<u64>().map_err(|source| InputError::Malformed {
        input: token.to_string(),
        source,
    })?;

    if budget == 0 {
        return Err(InputError::Zero);
    }
    Ok(budget)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_a_plain_integer() {
        assert_eq!(read_budget(&mut Cursor::new("1000\n")).unwrap(), 1000);
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        assert_eq!(read_budget(&mut Cursor::new("   42  trailing\n")).unwrap(), 42);
    }

    #[test]
    fn only_the_first_line_is_consumed() {
        let mut input = Cursor::new("7\n8\n");
        assert_eq!(read_budget(&mut input).unwrap(), 7);
        assert_eq!(read_budget(&mut input).unwrap(), 8);
    }

    #[test]
    fn empty_input_is_missing() {
        assert!(matches!(read_budget(&mut Cursor::new("")), Err(InputError::Missing)));
        assert!(matches!(read_budget(&mut Cursor::new("\n")), Err(InputError::Missing)));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = read_budget(&mut Cursor::new("lots\n")).unwrap_err();
        assert!(matches!(err, InputError::Malformed { ref input, .. } if input == "lots"));
    }

    #[test]
    fn negative_is_malformed() {
        assert!(matches!(
            read_budget(&mut Cursor::new("-5\n")),
            Err(InputError::Malformed { .. })
        ));
    }

    #[test]
    fn zero_is_rejected() {
        assert!(matches!(read_budget(&mut Cursor::new("0\n")), Err(InputError::Zero)));
    }
}
