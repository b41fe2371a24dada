/// Shaped like the game's quest progress lookup.
pub const GET_FLAG_PROGRESS: &str = "\
; Quest progress lookup
GetFlagProgress:
\t\tmove.l\ta0,-(sp)
\t\tlea\t(g_GameFlagProgress1).l,a0
\t\tbsr.w\tPickValueBasedOnFlags
\t\tdc.w\t$0031,$0200 ; second step
\t\tdc.w\t$0024,$0100
\t\tdc.w\t$FFFF
\t\taddq.l\t#1,a0
\t\tjsr\t(PickValueBasedOnFlags).l
\t\tdc.w\t$0100,$0500,$FFFF
\t\tmovea.l\t(sp)+,a0
\t\trts

Unrelated:
\t\tmoveq\t#0,d0
\t\trts
";
