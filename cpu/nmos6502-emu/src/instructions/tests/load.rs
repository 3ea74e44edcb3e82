use super::{ExpectedState, hash_map, run_test, run_test_with_memory};
use test_log::test;

#[test]
fn lda_immediate() {
    run_test(
        // LDA #$78
        "A978",
        ExpectedState { a: Some(0x78), p: Some(0x24), cycles: Some(2), ..ExpectedState::default() },
    );

    run_test(
        // LDA #$DD
        "A9DD",
        ExpectedState { a: Some(0xDD), p: Some(0xA4), cycles: Some(2), ..ExpectedState::default() },
    );

    run_test(
        // LDA #$00
        "A900",
        ExpectedState { a: Some(0x00), p: Some(0x26), cycles: Some(2), ..ExpectedState::default() },
    );
}

#[test]
fn ldx_ldy_immediate() {
    run_test(
        // LDX #$DD
        "A2DD",
        ExpectedState { x: Some(0xDD), p: Some(0xA4), cycles: Some(2), ..ExpectedState::default() },
    );

    run_test(
        // LDY #$00
        "A000",
        ExpectedState { y: Some(0x00), p: Some(0x26), cycles: Some(2), ..ExpectedState::default() },
    );
}

#[test]
fn lda_zero_page() {
    run_test_with_memory(
        // LDA $45
        "A545",
        &[(0x0045, 0xBA)],
        ExpectedState { a: Some(0xBA), p: Some(0xA4), cycles: Some(3), ..ExpectedState::default() },
    );
}

#[test]
fn lda_zero_page_x_wraps_within_page_zero() {
    run_test_with_memory(
        // LDX #$FF; LDA $46,X
        "A2FF B546",
        &[(0x0045, 0x12), (0x0145, 0x99)],
        ExpectedState { a: Some(0x12), p: Some(0x24), cycles: Some(6), ..ExpectedState::default() },
    );
}

#[test]
fn ldx_zero_page_y() {
    run_test_with_memory(
        // LDY #$05; LDX $40,Y
        "A005 B640",
        &[(0x0045, 0x80)],
        ExpectedState { x: Some(0x80), p: Some(0xA4), cycles: Some(6), ..ExpectedState::default() },
    );
}

#[test]
fn lda_absolute() {
    run_test_with_memory(
        // LDA $1234
        "AD3412",
        &[(0x1234, 0x55)],
        ExpectedState { a: Some(0x55), p: Some(0x24), cycles: Some(4), ..ExpectedState::default() },
    );
}

#[test]
fn lda_absolute_y() {
    run_test_with_memory(
        // LDY #$10; LDA $1201,Y
        "A010 B90112",
        &[(0x1211, 0x7F)],
        ExpectedState { a: Some(0x7F), p: Some(0x24), cycles: Some(6), ..ExpectedState::default() },
    );

    run_test_with_memory(
        // LDY #$FF; LDA $1201,Y crosses into page $13
        "A0FF B90112",
        &[(0x1300, 0x7F), (0x1200, 0x01)],
        ExpectedState { a: Some(0x7F), p: Some(0x24), cycles: Some(7), ..ExpectedState::default() },
    );
}

#[test]
fn ldy_absolute_x() {
    run_test(
        // LDX #$10; LDY $0200,X
        "A210 BC0002",
        ExpectedState { y: Some(0x00), p: Some(0x26), cycles: Some(6), ..ExpectedState::default() },
    );
}

#[test]
fn lda_indirect_x() {
    run_test_with_memory(
        // LDX #$04; LDA ($3C,X)
        "A204 A13C",
        &[(0x0040, 0x00), (0x0041, 0x03), (0x0300, 0x99)],
        ExpectedState { a: Some(0x99), p: Some(0xA4), cycles: Some(8), ..ExpectedState::default() },
    );

    run_test_with_memory(
        // LDX #$01; LDA ($FE,X): pointer high byte comes from $00, not $100
        "A201 A1FE",
        &[(0x00FF, 0x10), (0x0000, 0x02), (0x0100, 0x05), (0x0210, 0x33)],
        ExpectedState { a: Some(0x33), p: Some(0x24), cycles: Some(8), ..ExpectedState::default() },
    );
}

#[test]
fn lda_indirect_y() {
    run_test_with_memory(
        // LDY #$10; LDA ($40),Y
        "A010 B140",
        &[(0x0040, 0x00), (0x0041, 0x03), (0x0310, 0x44)],
        ExpectedState { a: Some(0x44), p: Some(0x24), cycles: Some(7), ..ExpectedState::default() },
    );

    run_test_with_memory(
        // LDY #$FF; LDA ($40),Y crosses from page 3 to page 4
        "A0FF B140",
        &[(0x0040, 0x80), (0x0041, 0x03), (0x047F, 0x01)],
        ExpectedState { a: Some(0x01), p: Some(0x24), cycles: Some(8), ..ExpectedState::default() },
    );
}

#[test]
fn sta() {
    run_test(
        // LDA #$42; STA $45
        "A942 8545",
        ExpectedState {
            memory: hash_map! { 0x0045: 0x42 },
            cycles: Some(5),
            ..ExpectedState::default()
        },
    );

    run_test(
        // LDA #$42; STA $0200
        "A942 8D0002",
        ExpectedState {
            memory: hash_map! { 0x0200: 0x42 },
            cycles: Some(6),
            ..ExpectedState::default()
        },
    );

    run_test(
        // LDA #$42; LDX #$FF; STA $0201,X
        "A942 A2FF 9D0102",
        ExpectedState {
            p: Some(0xA4),
            memory: hash_map! { 0x0300: 0x42, 0x0200: 0x00 },
            cycles: Some(9),
            ..ExpectedState::default()
        },
    );

    // Stores take the fix-up cycle whether or not the page changes
    run_test_with_memory(
        // LDA #$42; LDY #$10; STA ($40),Y
        "A942 A010 9140",
        &[(0x0040, 0x00), (0x0041, 0x03)],
        ExpectedState {
            p: Some(0x24),
            memory: hash_map! { 0x0310: 0x42 },
            cycles: Some(10),
            ..ExpectedState::default()
        },
    );
}

#[test]
fn stx_sty() {
    run_test(
        // LDX #$AB; LDY #$04; STX $41,Y
        "A2AB A004 9641",
        ExpectedState {
            p: Some(0x24),
            memory: hash_map! { 0x0045: 0xAB },
            cycles: Some(8),
            ..ExpectedState::default()
        },
    );

    run_test(
        // LDY #$77; STY $1234
        "A077 8C3412",
        ExpectedState {
            memory: hash_map! { 0x1234: 0x77 },
            cycles: Some(6),
            ..ExpectedState::default()
        },
    );
}

#[test]
fn register_transfers() {
    run_test(
        // LDA #$80; TAX
        "A980 AA",
        ExpectedState { x: Some(0x80), p: Some(0xA4), cycles: Some(4), ..ExpectedState::default() },
    );

    run_test(
        // LDA #$05; LDX #$00; TXA
        "A905 A200 8A",
        ExpectedState { a: Some(0x00), p: Some(0x26), cycles: Some(6), ..ExpectedState::default() },
    );

    run_test(
        // LDA #$05; TAY
        "A905 A8",
        ExpectedState { y: Some(0x05), p: Some(0x24), cycles: Some(4), ..ExpectedState::default() },
    );

    run_test(
        // LDY #$FF; LDA #$00; TYA
        "A0FF A900 98",
        ExpectedState { a: Some(0xFF), p: Some(0xA4), cycles: Some(6), ..ExpectedState::default() },
    );

    run_test(
        // TSX
        "BA",
        ExpectedState { x: Some(0xFD), p: Some(0xA4), cycles: Some(2), ..ExpectedState::default() },
    );

    run_test(
        // LDX #$00; TXS does not touch the flags
        "A200 9A",
        ExpectedState { s: Some(0x00), p: Some(0x26), cycles: Some(4), ..ExpectedState::default() },
    );
}
