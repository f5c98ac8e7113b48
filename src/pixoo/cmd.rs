/// `Command` names of the Pixoo HTTP API (`POST /post`)
pub struct Cmd;
impl Cmd {
    // Frame upload
    pub const SEND_HTTP_GIF: &'static str = "Draw/SendHttpGif";
    pub const GET_HTTP_GIF_ID: &'static str = "Draw/GetHttpGifId";
    pub const RESET_HTTP_GIF_ID: &'static str = "Draw/ResetHttpGifId";

    // Channel control
    pub const SET_CHANNEL: &'static str = "Channel/SetIndex";
    pub const SET_VISUALIZER: &'static str = "Channel/SetEqPosition";
    pub const SET_CLOCK: &'static str = "Channel/SetClockSelectId";
    pub const SET_BRIGHTNESS: &'static str = "Channel/SetBrightness";
}

/*
Envelope fields per command:
Draw/SendHttpGif         - PicNum, PicWidth, PicOffset, PicID, PicSpeed, PicData (base64 RGB)
Draw/GetHttpGifId        - reply carries PicId
Channel/SetIndex         - SelectIndex
Channel/SetEqPosition    - EqPosition
Channel/SetClockSelectId - ClockId
Channel/SetBrightness    - Brightness (0-100)
Every reply carries error_code, 0 on success
*/
