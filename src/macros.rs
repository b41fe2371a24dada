/// Builds an [`Instruction`](crate::script::asm::Instruction):
/// `ins!("addq", L; 1u32, "a0")` is `addq.l #1,a0`.
macro_rules! ins {
    (@width) => {
        $crate::script::asm::Width::None
    };
    (@width $w:ident) => {
        $crate::script::asm::Width::$w
    };
    ($mnemonic:literal $(, $width:ident)? $(; $($op:expr),+ $(,)?)?) => {{
        #[allow(unused_mut)]
        let mut operands = ::arrayvec::ArrayVec::new();
        $($(operands.push($crate::script::asm::Operand::from($op));)+)?
        $crate::script::asm::Instruction {
            mnemonic: $mnemonic.to_string(),
            width: ins!(@width $($width)?),
            operands,
        }
    }};
}
