use super::*;

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(128, 255), 128);
    assert_eq!(mul_div255_u16(0, 255), 0);
    assert_eq!(mul_div255_u8(255, 128), 128);
}

#[test]
fn unpremul_inverts_premul_for_opaque_and_half_alpha() {
    assert_eq!(unpremul_u8(mul_div255_u8(200, 255), 255), 200);
    let p = mul_div255_u8(255, 128);
    assert_eq!(p, 128);
    assert_eq!(unpremul_u8(p, 128), 255);
    assert_eq!(unpremul_u8(10, 0), 0);
}
