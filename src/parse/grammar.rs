use serde_json::{Map, Number, Value};
use winnow::ascii::{digit0, digit1, till_line_ending};
use winnow::combinator::{alt, cut_err, opt, repeat};
use winnow::error::{ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_until, take_while};

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_whitespace() || c == '\u{feff}').void(),
            ("//", till_line_ending).void(),
            ("/*", cut_err((take_until(0.., "*/"), "*/")))
                .context(StrContext::Expected(StrContextValue::StringLiteral("*/")))
                .void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Identifiers ------------------------------------------------------------

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1, |c: char| c.is_alphabetic() || c == '_' || c == '$'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_' || c == '$'),
    )
        .take()
        .parse_next(input)
}

// -- Strings ----------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    let quote = one_of(['"', '\'']).parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = cut_err(any)
            .context(StrContext::Expected(StrContextValue::Description(
                "closing quote",
            )))
            .parse_next(input)?;
        match ch {
            c if c == quote => return Ok(s),
            '\n' | '\r' => return Err(ErrMode::from_input(input).cut()),
            '\\' => escape(input, &mut s)?,
            c => s.push(c),
        }
    }
}

fn escape(input: &mut &str, out: &mut String) -> ModalResult<()> {
    let esc = cut_err(any).parse_next(input)?;
    match esc {
        'b' => out.push('\u{8}'),
        'f' => out.push('\u{c}'),
        'n' => out.push('\n'),
        'r' => out.push('\r'),
        't' => out.push('\t'),
        'v' => out.push('\u{b}'),
        '0' => out.push('\0'),
        'u' => out.push(unicode_escape(input)?),
        // Line continuation.
        '\n' => {}
        '\r' => {
            let _ = opt('\n').parse_next(input)?;
        }
        other => out.push(other),
    }
    Ok(())
}

fn hex4(input: &mut &str) -> ModalResult<u32> {
    cut_err(take_while(4, |c: char| c.is_ascii_hexdigit()))
        .context(StrContext::Expected(StrContextValue::Description(
            "four hex digits",
        )))
        .parse_next(input)
        .and_then(|hex| u32::from_str_radix(hex, 16).map_err(|_| ErrMode::from_input(input).cut()))
}

fn unicode_escape(input: &mut &str) -> ModalResult<char> {
    let high = hex4(input)?;
    let code = if (0xD800..0xDC00).contains(&high) {
        cut_err("\\u").parse_next(input)?;
        let low = hex4(input)?;
        if !(0xDC00..0xE000).contains(&low) {
            return Err(ErrMode::from_input(input).cut());
        }
        0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
    } else {
        high
    };
    char::from_u32(code).ok_or_else(|| ErrMode::from_input(input).cut())
}

// -- Numbers ----------------------------------------------------------------

fn number(input: &mut &str) -> ModalResult<Value> {
    let text = (
        opt(one_of(['+', '-'])),
        alt(((digit1, opt(('.', digit0))).void(), ('.', digit1).void())),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), cut_err(digit1))),
    )
        .take()
        .parse_next(input)?;
    let text = text.strip_prefix('+').unwrap_or(text);

    if !text.contains(['.', 'e', 'E']) {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::from(i));
        }
    }
    let f: f64 = text
        .parse()
        .map_err(|_| ErrMode::from_input(input).cut())?;
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| ErrMode::from_input(input).cut())
}

// -- Values -----------------------------------------------------------------

fn keyword(input: &mut &str) -> ModalResult<Value> {
    alt((
        "true".value(Value::Bool(true)),
        "false".value(Value::Bool(false)),
        "null".value(Value::Null),
    ))
    .parse_next(input)
}

fn value(input: &mut &str) -> ModalResult<Value> {
    ws.parse_next(input)?;
    alt((
        object.map(Value::Object),
        array.map(Value::Array),
        string_literal.map(Value::String),
        keyword,
        number,
    ))
    .context(StrContext::Expected(StrContextValue::Description("value")))
    .parse_next(input)
}

fn key(input: &mut &str) -> ModalResult<String> {
    alt((string_literal, ident.map(str::to_owned))).parse_next(input)
}

fn object(input: &mut &str) -> ModalResult<Map<String, Value>> {
    '{'.parse_next(input)?;
    let mut map = Map::new();
    loop {
        ws.parse_next(input)?;
        if opt('}').parse_next(input)?.is_some() {
            return Ok(map);
        }
        let k = cut_err(key)
            .context(StrContext::Expected(StrContextValue::Description(
                "object key",
            )))
            .parse_next(input)?;
        ws.parse_next(input)?;
        cut_err(':')
            .context(StrContext::Expected(StrContextValue::CharLiteral(':')))
            .parse_next(input)?;
        let v = cut_err(value).parse_next(input)?;
        map.insert(k, v);

        ws.parse_next(input)?;
        if opt(',').parse_next(input)?.is_none() {
            cut_err('}')
                .context(StrContext::Expected(StrContextValue::CharLiteral('}')))
                .parse_next(input)?;
            return Ok(map);
        }
    }
}

fn array(input: &mut &str) -> ModalResult<Vec<Value>> {
    '['.parse_next(input)?;
    let mut items = Vec::new();
    loop {
        ws.parse_next(input)?;
        if opt(']').parse_next(input)?.is_some() {
            return Ok(items);
        }
        items.push(cut_err(value).parse_next(input)?);

        ws.parse_next(input)?;
        if opt(',').parse_next(input)?.is_none() {
            cut_err(']')
                .context(StrContext::Expected(StrContextValue::CharLiteral(']')))
                .parse_next(input)?;
            return Ok(items);
        }
    }
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_document(input: &mut &str) -> ModalResult<Value> {
    let document = value.parse_next(input)?;
    ws.parse_next(input)?;
    Ok(document)
}
