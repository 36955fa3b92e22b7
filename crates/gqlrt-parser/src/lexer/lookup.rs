use crate::TokenKind;

static PUNCTUATION_CHARS: [Option<TokenKind>; 256] = punctuation_lut();
static NAME_CHARS: [u8; 256] = name_lut();

const NAME_START: u8 = 0b01;
const NAME_CONTINUE: u8 = 0b10;

#[inline]
pub(crate) fn punctuation_kind(c: char) -> Option<TokenKind> {
    if c.is_ascii() {
        PUNCTUATION_CHARS[c as usize]
    } else {
        None
    }
}

/// <https://spec.graphql.org/October2021/#NameStart>
#[inline]
pub(crate) fn is_name_start(c: char) -> bool {
    c.is_ascii() && NAME_CHARS[c as usize] & NAME_START != 0
}

/// <https://spec.graphql.org/October2021/#NameContinue>
#[inline]
pub(crate) fn is_name_continue(c: char) -> bool {
    c.is_ascii() && NAME_CHARS[c as usize] & NAME_CONTINUE != 0
}

const fn punctuation_lut() -> [Option<TokenKind>; 256] {
    let mut lut = [None; 256];
    lut[b'{' as usize] = Some(TokenKind::LCurly);
    lut[b'}' as usize] = Some(TokenKind::RCurly);
    lut[b'!' as usize] = Some(TokenKind::Bang);
    lut[b'$' as usize] = Some(TokenKind::Dollar);
    lut[b'&' as usize] = Some(TokenKind::Amp);
    lut[b'(' as usize] = Some(TokenKind::LParen);
    lut[b')' as usize] = Some(TokenKind::RParen);
    lut[b':' as usize] = Some(TokenKind::Colon);
    lut[b'[' as usize] = Some(TokenKind::LBracket);
    lut[b']' as usize] = Some(TokenKind::RBracket);
    lut[b'=' as usize] = Some(TokenKind::Eq);
    lut[b'@' as usize] = Some(TokenKind::At);
    lut[b'|' as usize] = Some(TokenKind::Pipe);

    lut
}

const fn name_lut() -> [u8; 256] {
    let mut lut = [0; 256];
    let mut c = b'a';
    while c <= b'z' {
        lut[c as usize] = NAME_START | NAME_CONTINUE;
        lut[c.to_ascii_uppercase() as usize] = NAME_START | NAME_CONTINUE;
        c += 1;
    }
    let mut d = b'0';
    while d <= b'9' {
        lut[d as usize] = NAME_CONTINUE;
        d += 1;
    }
    lut[b'_' as usize] = NAME_START | NAME_CONTINUE;

    lut
}
