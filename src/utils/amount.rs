//! Amount formatting shared by anomaly descriptions and reports

use bigdecimal::BigDecimal;

/// Format an amount with thousands separators. Integral amounts print
/// without decimals, others with two.
pub fn format_amount(amount: &BigDecimal) -> String {
    let rounded = amount.round(2);
    let plain = if rounded.is_integer() {
        rounded.with_scale(0).to_string()
    } else {
        rounded.with_scale(2).to_string()
    };

    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}
