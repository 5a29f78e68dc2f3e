/// Split one RFC 4180 record into fields.
///
/// Quoted fields may contain the delimiter, and `""` inside quotes is an
/// escaped quote. Records never span lines.
pub fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();
    let mut field = String::new();

    loop {
        if chars.peek() == Some(&'"') {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => {
                        if chars.peek() == Some(&'"') {
                            chars.next();
                            field.push('"');
                        } else {
                            break;
                        }
                    }
                    Some(c) => field.push(c),
                    // unterminated quote: keep what we have
                    None => break,
                }
            }
            // drop anything between the closing quote and the delimiter
            let mut ended = true;
            for c in chars.by_ref() {
                if c == delimiter {
                    ended = false;
                    break;
                }
            }
            fields.push(std::mem::take(&mut field));
            if ended {
                return fields;
            }
        } else {
            let mut ended = true;
            for c in chars.by_ref() {
                if c == delimiter {
                    ended = false;
                    break;
                }
                field.push(c);
            }
            fields.push(std::mem::take(&mut field));
            if ended {
                return fields;
            }
        }
    }
}
